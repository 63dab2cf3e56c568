//! 라우트 정의.

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::AppState;

/// 공개 라우터 생성
pub fn routes() -> Router<AppState> {
    Router::new()
        // 비콘 인제스트
        .route("/ingest", post(handlers::ingest::ingest))
        // 푸시 채널 (WebSocket)
        .route("/ws", get(handlers::ws::upgrade))
        // 분 단위 집계 스냅샷
        .route("/metrics/minute", get(handlers::metrics::minute_metrics))
        // 생존 확인
        .route("/healthz", get(handlers::health::healthz))
        .fallback(not_found)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
