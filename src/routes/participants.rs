//! # 참여자(Participant) 라우트 핸들러
//!
//! 저장된 분석 세션에서 특정 참여자의 전체 메시지 이력을 조회하는
//! 읽기 전용 엔드포인트입니다. 결과 화면에서 참여자를 눌렀을 때
//! 호출됩니다.
//!
//! ## 엔드포인트
//! | 메서드 | 경로 | 설명 |
//! |--------|------|------|
//! | GET | /api/v1/participants/messages?participant_id=… | 참여자 id로 조회 |
//! | GET | /api/v1/participants/messages?session_id=…&name=… | 세션 id + 이름으로 조회 |
//!
//! 두 지정 방식 중 하나는 반드시 있어야 하며, 둘 다 없으면 400입니다.

use crate::{
    db,
    error::AppError,
    models::ParticipantMessagesQuery,
    routes::analysis::AppState,
};
use axum::{
    extract::{Query, State}, // Query: URL 쿼리 파라미터(?key=value)를 추출하는 추출자
    Json,
};
use serde_json::{json, Value};

/// `GET /participants/messages` — 참여자의 전체 메시지 이력을 조회합니다.
///
/// 메시지는 **시각 오름차순**으로 정렬되고, 빈 메시지(NULL 본문)는
/// 빈 문자열로 돌려줍니다.
///
/// ## 응답 형태
/// `{ "participant": "철수", "messages": [{ "timestamp": "...", "text": "..." }] }`
///
/// ## 에러 처리
/// - 식별자 누락 (participant_id도, session_id+name도 없음): 400
/// - 참여자를 찾지 못함: 404
/// - DB 에러: 500 (원인은 서버 로그에만 기록)
pub async fn participant_messages(
    State(state): State<AppState>,
    Query(query): Query<ParticipantMessagesQuery>,
) -> Result<Json<Value>, AppError> {
    // 지정 방식 1: 참여자 id 단독
    let participant = if let Some(id) = query.participant_id.as_deref() {
        db::get_participant(&state.pool, id)
            .await?
            .ok_or(AppError::NotFound)?
    }
    // 지정 방식 2: 세션 id + 참여자 이름
    else if let (Some(session_id), Some(name)) =
        (query.session_id.as_deref(), query.name.as_deref())
    {
        db::find_participant_by_name(&state.pool, session_id, name)
            .await?
            .ok_or(AppError::NotFound)?
    }
    // 둘 다 없으면 검증 실패
    else {
        return Err(AppError::BadRequest(
            "Either participant_id or session_id + name is required".to_string(),
        ));
    };

    let messages = db::list_participant_messages(&state.pool, &participant.id).await?;

    Ok(Json(json!({
        "participant": participant.name,
        "messages": messages,
    })))
}
