//! 프로세스 생존 확인 핸들러.

use axum::http::StatusCode;

/// 생존 확인
///
/// GET /healthz — 엣지 프로세스 자체의 도달 가능성만 의미하며,
/// 허브(코디네이터)의 건강 상태를 보장하지 않는다.
pub async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
