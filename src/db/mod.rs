//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 라우트 핸들러(routes/)에서 이 모듈의 함수를 호출하여 DB 작업을 수행합니다.
//!
//! 각 하위 모듈:
//! - `sessions`: 분석 세션 전체 교체(replace-all) 쓰기와 현재 세션 조회
//! - `participants`: 참여자/메시지 읽기 전용 쿼리

pub mod participants;
pub mod sessions;

// 하위 모듈의 모든 공개 함수를 재공개(re-export)하여
// `crate::db::replace_session`처럼 바로 접근할 수 있게 합니다.
pub use participants::*;
pub use sessions::*;
