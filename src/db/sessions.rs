//! # 분석 세션 쓰기/조회 쿼리 모듈
//!
//! 시스템은 분석 세션을 단 하나만 유지합니다(싱글턴).
//! `replace_session`은 기존 세션의 모든 데이터를 지우고 새 분석 결과를
//! 통째로 다시 쓰는 전체 교체(replace-all) 연산이며,
//! **하나의 트랜잭션**으로 실행됩니다. 중간에 실패하면 전부 롤백되어
//! 이전 세션이 그대로 남습니다 — 반쯤 쓰인 세션은 존재할 수 없습니다.

use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{NewParticipant, NewSession, Session};

/// 메시지 bulk insert의 문장당 최대 행 수.
///
/// SQLite의 문장당 바인딩 파라미터 개수 제한 때문에 한 INSERT에
/// 넣을 수 있는 행 수가 유한합니다. 500행 × 4칼럼 = 2000 파라미터로
/// 제한에 넉넉히 들어갑니다.
pub const MESSAGE_INSERT_BATCH: usize = 500;

/// 메시지 타임스탬프의 저장 형식 (ISO-8601).
/// 문자열 정렬이 곧 시간순 정렬이 되는 형식입니다.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// 날짜(시각 없음)의 저장 형식
const DATE_FORMAT: &str = "%Y-%m-%d";

/// 세션을 통째로 교체합니다.
///
/// 1. 세 테이블(messages → participants → sessions)의 모든 행 삭제
/// 2. 새 세션 행 삽입
/// 3. 참여자를 순위 순서대로 삽입 (UUIDv7 id를 미리 생성)
/// 4. 각 참여자의 전체 메시지를 500행 단위로 bulk insert
///
/// 전 과정이 하나의 트랜잭션입니다. 어느 단계에서든 에러가 나면
/// `?`로 함수를 빠져나가며, 커밋되지 않은 트랜잭션은 Drop 시점에
/// 자동으로 롤백됩니다.
///
/// # 반환값
/// 새로 만들어진 세션의 id
pub async fn replace_session(
    pool: &SqlitePool,
    new_session: &NewSession,
    participants: &[NewParticipant],
) -> Result<String, AppError> {
    // pool.begin(): 트랜잭션 시작. 이후 쿼리는 &mut *tx로 실행합니다.
    let mut tx = pool.begin().await?;

    // ── 1단계: 전체 삭제 (자식 테이블부터) ──
    // 외래키 순서를 지켜 messages → participants → sessions 순으로 지웁니다.
    sqlx::query("DELETE FROM messages").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM participants").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM sessions").execute(&mut *tx).await?;

    // ── 2단계: 새 세션 삽입 ──
    let session_id = uuid::Uuid::now_v7().to_string();

    // 불용어 목록은 JSON 배열 문자열로 저장합니다.
    let stop_words_json = serde_json::to_string(&new_session.stop_words)
        .map_err(|e| AppError::Internal(format!("Failed to serialize stop words: {e}")))?;

    sqlx::query(
        r#"
        INSERT INTO sessions (id, start_date, end_date, target_user, stop_words)
        VALUES (?, ?, ?, ?, ?)
        "#,
        // ↑ created_at은 스키마의 DEFAULT(현재 UTC 시각)가 채웁니다.
    )
    .bind(&session_id)
    // Option<String>: Some이면 값을, None이면 SQL NULL을 바인딩합니다.
    .bind(new_session.start_date.map(|d| d.format(DATE_FORMAT).to_string()))
    .bind(new_session.end_date.map(|d| d.format(DATE_FORMAT).to_string()))
    .bind(&new_session.target_user)
    .bind(&stop_words_json)
    .execute(&mut *tx)
    .await?;

    // ── 3~4단계: 참여자와 메시지 삽입 ──
    // participants는 이미 순위 순서입니다. UUIDv7은 생성 시각 기준으로
    // 정렬되므로, 순서대로 생성한 id의 정렬 순서 = 순위 순서가 됩니다.
    for participant in participants {
        let participant_id = uuid::Uuid::now_v7().to_string();

        let top_words_json = serde_json::to_string(&participant.top_words)
            .map_err(|e| AppError::Internal(format!("Failed to serialize top words: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO participants (id, session_id, name, total_messages, top_words)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&participant_id)
        .bind(&session_id)
        .bind(&participant.name)
        .bind(participant.total_messages)
        .bind(&top_words_json)
        .execute(&mut *tx)
        .await?;

        // 메시지는 500행 단위의 multi-row INSERT로 나눠 넣습니다.
        // .chunks(n): 슬라이스를 최대 n개씩의 조각으로 나누는 이터레이터
        // (예: 1200건 → 500, 500, 200)
        for chunk in participant.messages.chunks(MESSAGE_INSERT_BATCH) {
            // ── 동적 쿼리 구성 ──
            // 행 수만큼 "(?, ?, ?, ?)" 자리표시자를 이어붙입니다.
            let mut sql = String::from(
                "INSERT INTO messages (id, participant_id, timestamp, text) VALUES ",
            );
            sql.push_str(&vec!["(?, ?, ?, ?)"; chunk.len()].join(", "));

            // 구성한 SQL에 행 순서대로 값을 바인딩합니다.
            let mut query = sqlx::query(&sql);
            for message in chunk {
                query = query
                    .bind(uuid::Uuid::now_v7().to_string())
                    .bind(&participant_id)
                    .bind(message.timestamp.format(TIMESTAMP_FORMAT).to_string())
                    // 빈 본문은 '' 대신 NULL로 저장합니다.
                    .bind(if message.text.is_empty() {
                        None
                    } else {
                        Some(message.text.as_str())
                    });
            }
            query.execute(&mut *tx).await?;
        }
    }

    // ── 커밋 ──
    // 여기까지 에러 없이 도달했을 때만 전체 교체가 확정됩니다.
    tx.commit().await?;

    tracing::info!(
        "Replaced analysis session: id={}, participants={}",
        session_id,
        participants.len()
    );

    Ok(session_id)
}

/// 현재 유지 중인 세션을 조회합니다.
///
/// # 반환값
/// - `Ok(Some(Session))`: 분석이 한 번이라도 수행된 경우 (POPULATED)
/// - `Ok(None)`: 아직 세션이 없는 경우 (EMPTY)
pub async fn current_session(pool: &SqlitePool) -> Result<Option<Session>, AppError> {
    let session = sqlx::query_as::<_, Session>(
        r#"
        SELECT id, start_date, end_date, target_user, stop_words, created_at
        FROM sessions
        ORDER BY created_at DESC
        LIMIT 1
        "#,
        // ↑ 세션은 하나만 유지되므로 가장 최근 행이 곧 현재 세션입니다.
    )
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageEntry, WordCount};
    use chrono::NaiveDate;
    use sqlx::sqlite::SqlitePoolOptions;

    /// 인메모리 SQLite 풀을 만들고 마이그레이션을 적용합니다.
    ///
    /// 인메모리 DB는 연결마다 별개이므로 반드시 연결을 1개로 제한합니다.
    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("connect to in-memory sqlite");
        sqlx::migrate!("./migrations").run(&pool).await.expect("run migrations");
        pool
    }

    fn entry(day: u32, text: &str) -> MessageEntry {
        MessageEntry {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            text: text.to_string(),
        }
    }

    fn new_session(target: &str) -> NewSession {
        NewSession {
            start_date: None,
            end_date: None,
            target_user: target.to_string(),
            stop_words: vec!["사진".to_string()],
        }
    }

    fn participant(name: &str, messages: Vec<MessageEntry>) -> NewParticipant {
        NewParticipant {
            name: name.to_string(),
            total_messages: messages.len() as i64,
            top_words: vec![WordCount { word: "안녕".into(), count: 1 }],
            messages,
        }
    }

    #[tokio::test]
    async fn test_replace_session_persists_everything() {
        let pool = memory_pool().await;

        let participants = vec![
            participant("철수", vec![entry(1, "안녕"), entry(2, "뭐해")]),
            participant("영희", vec![entry(1, "그래")]),
        ];
        let session_id = replace_session(&pool, &new_session("철수"), &participants)
            .await
            .expect("replace");

        let session = current_session(&pool).await.expect("query").expect("present");
        assert_eq!(session.id, session_id);
        assert_eq!(session.target_user, "철수");
        assert_eq!(session.stop_words, r#"["사진"]"#);

        let (message_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(message_count, 3);
    }

    #[tokio::test]
    async fn test_reingestion_fully_replaces_previous_session() {
        let pool = memory_pool().await;

        let first_id = replace_session(
            &pool,
            &new_session("철수"),
            &[participant("철수", vec![entry(1, "첫번째")])],
        )
        .await
        .expect("first replace");

        let second_id = replace_session(
            &pool,
            &new_session("영희"),
            &[participant("영희", vec![entry(2, "두번째")])],
        )
        .await
        .expect("second replace");

        assert_ne!(first_id, second_id);

        // 세션은 단 하나만 남습니다.
        let (session_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(session_count, 1);

        // 첫 세션 id는 더 이상 조회되지 않습니다.
        let old: Option<Session> = sqlx::query_as("SELECT * FROM sessions WHERE id = ?")
            .bind(&first_id)
            .fetch_optional(&pool)
            .await
            .expect("query");
        assert!(old.is_none());

        // 첫 세션의 참여자/메시지도 전부 사라집니다.
        let (participant_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM participants")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(participant_count, 1);
    }

    #[tokio::test]
    async fn test_bulk_insert_batches_of_500() {
        // 1200건 → 500, 500, 200 세 번의 INSERT로 나뉩니다.
        let messages: Vec<MessageEntry> =
            (0..1200).map(|i| entry(1, &format!("메시지 {i}"))).collect();

        let batch_sizes: Vec<usize> =
            messages.chunks(MESSAGE_INSERT_BATCH).map(<[MessageEntry]>::len).collect();
        assert_eq!(batch_sizes, vec![500, 500, 200]);

        let pool = memory_pool().await;
        replace_session(&pool, &new_session("철수"), &[participant("철수", messages)])
            .await
            .expect("replace");

        // 1200행 전부 저장됩니다.
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count, 1200);
    }

    #[tokio::test]
    async fn test_empty_text_stored_as_null() {
        let pool = memory_pool().await;
        replace_session(
            &pool,
            &new_session("철수"),
            &[participant("철수", vec![entry(1, ""), entry(2, "안녕")])],
        )
        .await
        .expect("replace");

        let (null_count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE text IS NULL")
                .fetch_one(&pool)
                .await
                .expect("count");
        assert_eq!(null_count, 1);
    }

    #[tokio::test]
    async fn test_current_session_empty_state() {
        let pool = memory_pool().await;
        assert!(current_session(&pool).await.expect("query").is_none());
    }
}
