//! API 에러 처리.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// API 에러
#[derive(Debug, Error)]
pub enum ApiError {
    /// 잘못된 요청 (클라이언트 입력 에러 — 코디네이터 도달 전 거부)
    #[error("잘못된 요청: {0}")]
    BadRequest(&'static str),

    /// 내부 서버 오류
    #[error("내부 서버 오류: {0}")]
    Internal(String),
}

/// 에러 응답 본문
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// 에러 메시지
    pub error: String,
    /// HTTP 상태 코드
    pub status: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = ErrorResponse {
            error: message,
            status: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<dxm_telemetry_hub::HubError> for ApiError {
    fn from(err: dxm_telemetry_hub::HubError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ApiError::BadRequest("Missing path");
        assert!(err.to_string().contains("Missing path"));
    }

    #[test]
    fn bad_request_maps_to_400() {
        let response = ApiError::BadRequest("Invalid JSON").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
