use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 대화 파일의 한 줄을 파싱한 결과. 파이프라인 안에서만 살아있는 임시 값입니다.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMessage {
    pub timestamp: NaiveDateTime,
    pub sender: String,
    pub text: String,
}

/// 참여자별 메시지 목록의 한 항목 (타임스탬프 + 본문).
/// 파일에서 읽은 순서(encounter order)를 그대로 유지합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub timestamp: NaiveDateTime,
    pub text: String,
}

/// 참여자 메시지 조회 응답의 한 행.
/// DB의 NULL 본문은 쿼리에서 빈 문자열로 변환(COALESCE)됩니다.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MessageResponse {
    pub timestamp: String,
    pub text: String,
}
