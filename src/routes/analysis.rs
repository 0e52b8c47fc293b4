//! # 분석(Analysis) 라우트 핸들러
//!
//! 대화 파일 업로드 → 분석 실행 → 저장과, 저장된 분석 결과 조회를
//! 처리하는 HTTP 핸들러 함수들입니다.
//!
//! ## 엔드포인트
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | POST | /api/v1/analysis | `create_analysis` | 파일 업로드 + 분석 실행 (전체 교체) |
//! | GET  | /api/v1/analysis | `get_analysis` | 현재 저장된 분석 결과 조회 |
//!
//! ## 업로드 요청 (multipart/form-data)
//! | 필드 | 필수 | 설명 |
//! |------|------|------|
//! | `file` | O | 내보내기된 대화 파일 (최대 100MB) |
//! | `start_date` | X | 분석 시작일 (YYYY-MM-DD, 포함) |
//! | `end_date` | X | 분석 종료일 (YYYY-MM-DD, 포함) |
//! | `target_user` | X | 심층 분석 대상 이름 (비어 있으면 기본값) |
//! | `stop_words` | X | 추가 불용어 (줄바꿈/쉼표 구분, 기본 목록에 합쳐짐) |
//!
//! ## 임시 파일 수명
//! 업로드 본문은 `NamedTempFile`로 임시 저장됩니다. 이 값이 핸들러
//! 스코프를 벗어나면(정상 종료든 `?`에 의한 조기 반환이든) Drop이
//! 파일을 삭제하므로, 분석 성공/실패와 무관하게 정리가 보장됩니다.

use crate::{
    db,            // 데이터베이스 접근 계층
    error::AppError,
    models::*,     // 데이터 모델 구조체들
    services,      // 분석 파이프라인 (파서/토크나이저/집계)
};
use axum::{
    extract::{
        multipart::MultipartError, // multipart 파싱 에러 타입
        Multipart,                 // multipart/form-data 요청 추출자
        State,
    },
    Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::NamedTempFile;
use tokio::{fs::File, io::AsyncWriteExt};

/// 업로드 파일 크기 상한 (100MB).
/// main.rs에서 DefaultBodyLimit 레이어로 강제되어,
/// 초과 요청은 분석이 시작되기 전에 거부됩니다.
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// 대상자 이름이 비어 있을 때 쓰는 기본값
const DEFAULT_TARGET_USER: &str = "이호준";

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// Axum의 의존성 주입(Dependency Injection) 메커니즘입니다.
#[derive(Clone)]
pub struct AppState {
    /// SQLite 연결 풀 (내부적으로 Arc로 공유)
    pub pool: SqlitePool,
    /// 업로드 파일의 임시 저장 디렉토리 경로
    pub uploads_path: String,
}

/// `POST /analysis` — 대화 파일을 업로드하고 분석을 실행합니다.
///
/// 흐름:
/// 1. multipart 필드를 읽으며 파일은 임시 파일로 스트리밍 저장
/// 2. 날짜/대상자/불용어 파라미터 검증 (실패 시 400)
/// 3. 파일을 줄 단위로 분석 (파서 → 날짜 필터 → 집계 → 요약)
/// 4. 세션 전체 교체 저장 (단일 트랜잭션)
/// 5. 요약 응답 반환
pub async fn create_analysis(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    // ── 1단계: multipart 필드 수집 ──
    let mut upload: Option<NamedTempFile> = None;
    let mut start_date_raw: Option<String> = None;
    let mut end_date_raw: Option<String> = None;
    let mut target_user_raw: Option<String> = None;
    let mut stop_words_raw: Option<String> = None;

    // next_field(): 다음 multipart 필드를 가져옵니다 (순서대로).
    while let Some(mut field) = multipart.next_field().await.map_err(invalid_multipart)? {
        // field.name()은 field를 빌리므로, 먼저 이름을 복사해 둡니다.
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                // 임시 파일을 업로드 디렉토리에 만듭니다.
                // NamedTempFile은 Drop 시점에 파일을 삭제합니다.
                let temp = tempfile::Builder::new()
                    .prefix("chatlog-")
                    .suffix(".txt")
                    .tempfile_in(&state.uploads_path)?;

                // 파일 본문을 청크 단위로 스트리밍 저장합니다.
                // 전체를 메모리에 올리지 않으므로 100MB 파일도 안전합니다.
                let mut out = File::create(temp.path()).await?;
                while let Some(chunk) = field.chunk().await.map_err(invalid_multipart)? {
                    out.write_all(&chunk).await?;
                }
                out.flush().await?;

                upload = Some(temp);
            }
            // field.text(): 필드 본문 전체를 문자열로 읽습니다 (field 소비).
            "start_date" => start_date_raw = Some(field.text().await.map_err(invalid_multipart)?),
            "end_date" => end_date_raw = Some(field.text().await.map_err(invalid_multipart)?),
            "target_user" => {
                target_user_raw = Some(field.text().await.map_err(invalid_multipart)?)
            }
            "stop_words" => stop_words_raw = Some(field.text().await.map_err(invalid_multipart)?),
            // 모르는 필드는 무시합니다.
            _ => {}
        }
    }

    // ── 2단계: 검증 ──
    // 파일은 필수입니다.
    let upload = upload
        .ok_or_else(|| AppError::BadRequest("A chat log file is required".to_string()))?;

    // 날짜는 각각 YYYY-MM-DD로 파싱되어야 하며, 둘 다 있으면 start ≤ end.
    let start_date = parse_date_field(start_date_raw.as_deref(), "start_date")?;
    let end_date = parse_date_field(end_date_raw.as_deref(), "end_date")?;
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(AppError::BadRequest(
                "start_date must be on or before end_date".to_string(),
            ));
        }
    }

    // 대상자 이름: trim 후 비어 있으면 기본값을 사용합니다.
    let target_user = match target_user_raw.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_TARGET_USER.to_string(),
    };

    // 불용어: 호출자 제공분을 기본 목록과 합칩니다.
    let extra_stop_words = services::tokenizer::parse_stop_words(stop_words_raw.as_deref());
    let tokenizer = services::tokenizer::Tokenizer::with_extra_words(&extra_stop_words);
    // 저장될 최종 목록 (정렬/중복 제거됨)
    let stop_word_list = tokenizer.stop_word_list();

    // ── 3단계: 분석 파이프라인 실행 ──
    let range = services::ingest::DateRange {
        start: start_date,
        end: end_date,
    };
    let outcome =
        services::ingest::analyze_file(upload.path(), &range, tokenizer, &target_user).await?;

    // ── 4단계: 세션 전체 교체 저장 (단일 트랜잭션) ──
    let new_session = NewSession {
        start_date,
        end_date,
        target_user: target_user.clone(),
        stop_words: stop_word_list,
    };
    let session_id = db::replace_session(&state.pool, &new_session, &outcome.participants).await?;

    // ── 5단계: 응답 구성 ──
    let user_messages = outcome
        .table
        .iter()
        .map(|summary| UserMessageCount {
            user: summary.name.clone(),
            count: summary.total_messages,
        })
        .collect();

    Ok(Json(AnalysisResponse {
        user_messages,
        total_messages: outcome.total_messages,
        analysis_table: outcome.table,
        target_user_summary: outcome.target,
        session_id,
    }))
    // 여기서 `upload`(NamedTempFile)가 Drop되며 임시 파일이 삭제됩니다.
    // 위의 어떤 `?`로 조기 반환해도 마찬가지입니다.
}

/// `GET /analysis` — 현재 저장된 분석 결과를 조회합니다.
///
/// 아직 분석이 한 번도 수행되지 않았으면 404를 반환합니다.
/// 참여자 목록은 순위 순서(메시지 수 내림차순)로 돌려줍니다.
pub async fn get_analysis(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let session = db::current_session(&state.pool)
        .await?
        .ok_or(AppError::NotFound)?;

    let participants = db::list_participants(&state.pool, &session.id).await?;
    let rows: Vec<Value> = participants
        .into_iter()
        .map(|p| {
            json!({
                "id": p.id,
                "name": p.name,
                "totalMessages": p.total_messages,
                // DB에는 JSON 문자열로 저장되어 있으므로 다시 값으로 파싱합니다.
                "topWords": serde_json::from_str::<Value>(&p.top_words)
                    .unwrap_or_else(|_| json!([])),
            })
        })
        .collect();

    Ok(Json(json!({
        "session": {
            "id": session.id,
            "startDate": session.start_date,
            "endDate": session.end_date,
            "targetUser": session.target_user,
            "stopWords": serde_json::from_str::<Value>(&session.stop_words)
                .unwrap_or_else(|_| json!([])),
            "createdAt": session.created_at,
        },
        "participants": rows,
    })))
}

/// multipart 파싱 실패를 400으로 변환합니다.
/// (잘못 구성된 업로드 요청은 클라이언트가 고쳐 재시도할 수 있습니다)
fn invalid_multipart(e: MultipartError) -> AppError {
    AppError::BadRequest(format!("Invalid multipart request: {e}"))
}

/// 선택적 날짜 필드를 파싱합니다.
///
/// - 필드가 없거나 공백뿐이면 `Ok(None)` (필터 미적용)
/// - 값이 있으면 반드시 YYYY-MM-DD여야 하며, 아니면 400
fn parse_date_field(raw: Option<&str>, field: &str) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                AppError::BadRequest(format!("Invalid {field}: expected YYYY-MM-DD"))
            }),
        None => Ok(None),
    }
}
