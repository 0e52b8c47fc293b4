//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들을 모아둔 모듈입니다.
//! Axum에서 핸들러는 HTTP 요청을 받아 응답을 반환하는 async 함수입니다.
//!
//! 각 하위 모듈:
//! - `analysis`: 대화 파일 업로드/분석 실행과 현재 분석 결과 조회
//! - `participants`: 참여자 메시지 이력 조회
//! - `health`: 서버 상태 확인 (헬스체크)

pub mod analysis;
pub mod health;
pub mod participants;

// 각 모듈의 핸들러 함수들을 재공개하여
// main.rs에서 `routes::create_analysis`처럼 바로 접근 가능하게 합니다.
pub use analysis::*;
pub use health::*;
pub use participants::*;
