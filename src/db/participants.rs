//! # 참여자/메시지 읽기 전용 쿼리 모듈
//!
//! 저장이 끝난 분석 결과를 나중에 탐색하는 읽기 경로입니다.
//! 참여자 id 또는 (세션 id + 이름) 조합으로 참여자를 찾고,
//! 그 참여자의 전체 메시지를 **시각 오름차순**으로 돌려줍니다.
//!
//! 주의: 수집(ingest) 단계는 파일에서 읽은 순서를 보존하지만,
//! 이 읽기 경로는 의도적으로 시각순 정렬을 적용합니다.

use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{MessageResponse, Participant};

/// id로 참여자 한 명을 조회합니다.
///
/// # 반환값
/// - `Ok(Some(Participant))`: 참여자를 찾은 경우
/// - `Ok(None)`: 해당 id의 참여자가 없는 경우
pub async fn get_participant(pool: &SqlitePool, id: &str) -> Result<Option<Participant>, AppError> {
    let participant = sqlx::query_as::<_, Participant>(
        r#"
        SELECT id, session_id, name, total_messages, top_words
        FROM participants
        WHERE id = ?
        "#,
    )
    .bind(id)
    // .fetch_optional(): 결과가 0행이면 None, 1행이면 Some을 반환합니다.
    .fetch_optional(pool)
    .await?;

    Ok(participant)
}

/// (세션 id, 이름) 조합으로 참여자 한 명을 조회합니다.
pub async fn find_participant_by_name(
    pool: &SqlitePool,
    session_id: &str,
    name: &str,
) -> Result<Option<Participant>, AppError> {
    let participant = sqlx::query_as::<_, Participant>(
        r#"
        SELECT id, session_id, name, total_messages, top_words
        FROM participants
        WHERE session_id = ? AND name = ?
        "#,
    )
    .bind(session_id)
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(participant)
}

/// 세션의 참여자 목록을 순위 순서로 조회합니다.
///
/// 메시지 수 내림차순이 기본이고, 동률은 id 오름차순으로 가릅니다.
/// id가 UUIDv7(시간 순서)이고 참여자를 순위 순서대로 삽입했으므로,
/// id 오름차순 = 삽입 순서 = 동률 시 처음 등장한 순서입니다.
pub async fn list_participants(
    pool: &SqlitePool,
    session_id: &str,
) -> Result<Vec<Participant>, AppError> {
    let participants = sqlx::query_as::<_, Participant>(
        r#"
        SELECT id, session_id, name, total_messages, top_words
        FROM participants
        WHERE session_id = ?
        ORDER BY total_messages DESC, id
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    Ok(participants)
}

/// 참여자의 전체 메시지를 시각 오름차순으로 조회합니다.
///
/// NULL 본문(빈 메시지)은 빈 문자열로 변환해 돌려줍니다.
pub async fn list_participant_messages(
    pool: &SqlitePool,
    participant_id: &str,
) -> Result<Vec<MessageResponse>, AppError> {
    let messages = sqlx::query_as::<_, MessageResponse>(
        r#"
        SELECT timestamp, COALESCE(text, '') AS text
        FROM messages
        WHERE participant_id = ?
        ORDER BY timestamp, id
        "#,
        // ↑ COALESCE(text, ''): NULL이면 ''를 반환하는 SQL 함수.
        //   동률 시각은 id(UUIDv7, 삽입 순서)로 갈라 결정적으로 만듭니다.
    )
    .bind(participant_id)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}
