//! 분 단위 집계 스냅샷 핸들러.

use axum::extract::State;
use axum::Json;
use dxm_telemetry_hub::aggregate::MinuteSnapshot;
use serde::Serialize;

use crate::error::ApiError;
use crate::AppState;

/// 메트릭 스냅샷 응답 DTO
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub ok: bool,
    /// 버킷 목록 (타임스탬프 오름차순)
    pub data: Vec<MinuteSnapshot>,
}

/// 분 단위 집계 조회
///
/// GET /metrics/minute
pub async fn minute_metrics(
    State(state): State<AppState>,
) -> Result<Json<MetricsResponse>, ApiError> {
    let data = state.hub.snapshot().await?;
    Ok(Json(MetricsResponse { ok: true, data }))
}
