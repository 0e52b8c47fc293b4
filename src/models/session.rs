use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// sessions 테이블의 한 행. 시스템은 세션을 단 하나만 유지합니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub target_user: String,
    /// 불용어 목록 (JSON 배열 문자열, 정렬/중복 제거됨)
    pub stop_words: String,
    pub created_at: String,
}

/// 새 세션 삽입에 필요한 값들. id와 created_at은 저장 시점에 생성됩니다.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub target_user: String,
    /// 정렬/중복 제거가 끝난 전체 불용어 목록 (기본값 + 호출자 제공분)
    pub stop_words: Vec<String>,
}

/// 단어와 등장 횟수 쌍
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: i64,
}

/// 참여자 한 명의 분석 요약 (전체 순위표의 한 행)
///
/// 응답 JSON은 프론트엔드 계약에 따라 camelCase를 사용합니다.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub name: String,
    pub total_messages: i64,
    /// 상위 단어 최대 10개, 횟수 내림차순 (동률은 먼저 등장한 단어 우선)
    pub top_words: Vec<WordCount>,
    /// 파일 순서 기준 마지막 5개 메시지
    pub sample_messages: Vec<super::MessageEntry>,
}

/// 심층 분석 대상 참여자의 요약
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetUserSummary {
    pub name: String,
    pub total_messages: i64,
    /// 상위 단어 최대 20개
    pub top_words: Vec<WordCount>,
    /// 전체 메시지 (파일에서 읽은 순서 그대로)
    pub chronological_messages: Vec<super::MessageEntry>,
}

/// 참여자별 메시지 수 (응답의 userMessages 항목)
#[derive(Debug, Clone, Serialize)]
pub struct UserMessageCount {
    pub user: String,
    pub count: i64,
}

/// 분석 업로드 요청의 최종 응답
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub user_messages: Vec<UserMessageCount>,
    pub total_messages: i64,
    pub analysis_table: Vec<UserSummary>,
    pub target_user_summary: Option<TargetUserSummary>,
    pub session_id: String,
}
