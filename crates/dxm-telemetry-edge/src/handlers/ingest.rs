//! 비콘 인제스트 핸들러.
//!
//! origin 검사 → JSON 파싱 → 새니타이즈 → 허브 전달.
//! 정책 거부(불허 origin, 레이트 리밋)는 에러가 아니라 202 소프트
//! 성공으로 응답한다 — 재시도 폭주와 허용 목록 노출을 막는다.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use dxm_telemetry_core::sanitize::sanitize;
use dxm_telemetry_core::{CoreError, RawBeacon};
use dxm_telemetry_hub::IngestOutcome;
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// 엣지가 제공하는 접속 IP 헤더 (프록시/CDN 뒤에서 설정됨)
const CONNECTING_IP_HEADER: &str = "cf-connecting-ip";

/// 엣지가 제공하는 지오로케이션 힌트 헤더
const COUNTRY_HEADER: &str = "cf-ipcountry";

/// 인제스트 응답 DTO
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub ok: bool,
    /// 샘플링 아웃 여부 (수락 시 생략)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampled_out: Option<bool>,
    /// 샘플링 아웃 사유
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl IngestResponse {
    fn accepted() -> Self {
        Self {
            ok: true,
            sampled_out: None,
            reason: None,
        }
    }

    fn sampled_out(reason: &'static str) -> Self {
        Self {
            ok: true,
            sampled_out: Some(true),
            reason: Some(reason),
        }
    }
}

/// 비콘 인제스트
///
/// POST /ingest
pub async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<RawBeacon>, JsonRejection>,
) -> Result<Response, ApiError> {
    // origin 검사가 본문 파싱보다 먼저다 — 불허 출처에는 파싱 에러조차
    // 돌려주지 않는다
    let origin = header_str(&headers, "origin");
    let referer = header_str(&headers, "referer");
    if !state.policy.ingest_allowed(origin, referer) {
        debug!("불허 origin, 샘플링 아웃: {:?}", origin);
        return Ok(soft_reject("invalid_origin"));
    }

    let Json(beacon) = body.map_err(|_| ApiError::BadRequest("Invalid JSON"))?;

    let event = sanitize(
        &beacon,
        header_str(&headers, CONNECTING_IP_HEADER),
        header_str(&headers, COUNTRY_HEADER),
        chrono::Utc::now().timestamp_millis(),
    )
    .map_err(|err| match err {
        CoreError::MissingField(_) => ApiError::BadRequest("Missing path"),
        other => ApiError::Internal(other.to_string()),
    })?;

    match state.hub.ingest(event).await? {
        IngestOutcome::Accepted => {
            Ok((StatusCode::ACCEPTED, Json(IngestResponse::accepted())).into_response())
        }
        IngestOutcome::SampledOut => Ok(soft_reject("rate_limited")),
    }
}

fn soft_reject(reason: &'static str) -> Response {
    (
        StatusCode::ACCEPTED,
        Json(IngestResponse::sampled_out(reason)),
    )
        .into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
