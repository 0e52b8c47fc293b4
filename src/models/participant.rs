use serde::Deserialize;

/// participants 테이블의 한 행. top_words는 JSON 문자열로 저장됩니다.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Participant {
    pub id: String,
    pub session_id: String,
    pub name: String,
    pub total_messages: i64,
    pub top_words: String,
}

/// 세션 교체 시 저장할 참여자 한 명의 데이터 (순위 순서대로 전달됨).
/// messages는 파일에서 읽은 순서 그대로의 전체 메시지 목록입니다.
#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub name: String,
    pub total_messages: i64,
    pub top_words: Vec<super::WordCount>,
    pub messages: Vec<super::MessageEntry>,
}

/// 참여자 메시지 조회의 쿼리 파라미터.
/// `participant_id` 단독, 또는 `session_id` + `name` 조합 중 하나가 필요합니다.
#[derive(Debug, Deserialize)]
pub struct ParticipantMessagesQuery {
    pub participant_id: Option<String>,
    pub session_id: Option<String>,
    pub name: Option<String>,
}
