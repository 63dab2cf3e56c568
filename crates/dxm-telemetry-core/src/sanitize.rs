//! 비콘 정규화 (새니타이저).
//!
//! 신뢰할 수 없는 `RawBeacon`을 정규 `TelemetryEvent`로 변환한다.
//! 경로는 쿼리 제거 후 절단, 리퍼러는 origin + path로 축약,
//! 접속 IP는 DJB2 해시로 가명화한다.

use crate::error::CoreError;
use crate::event::{RawBeacon, TelemetryEvent};
use crate::hash::djb2_hash;
use url::Url;

/// 경로 최대 길이
const MAX_PATH_LEN: usize = 200;

/// 리퍼러 최대 길이
const MAX_REF_LEN: usize = 500;

/// 원시 비콘을 정규 이벤트로 변환
///
/// `path`가 없거나 비어 있으면 `CoreError::MissingField` — 비콘은
/// 코디네이터에 도달하기 전에 거부된다.
///
/// # Arguments
/// * `client_ip` — 접속 원본 IP (알 수 없으면 None)
/// * `edge_country` — 엣지가 제공한 지오로케이션 힌트 (페이로드보다 우선)
/// * `now_ms` — 서버 타임스탬프 (epoch ms)
pub fn sanitize(
    beacon: &RawBeacon,
    client_ip: Option<&str>,
    edge_country: Option<&str>,
    now_ms: i64,
) -> Result<TelemetryEvent, CoreError> {
    let raw_path = beacon
        .path
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or(CoreError::MissingField("path"))?;

    let path = truncate_chars(raw_path.split('?').next().unwrap_or(raw_path), MAX_PATH_LEN);
    let referrer = sanitize_referrer(beacon.referrer.as_deref().unwrap_or(""));

    Ok(TelemetryEvent {
        ts: now_ms,
        path,
        referrer,
        ua_hash: beacon.ua_hash.clone().unwrap_or_default(),
        ip_hash: client_ip
            .filter(|ip| !ip.is_empty())
            .map(djb2_hash),
        country: edge_country
            .map(str::to_string)
            .or_else(|| beacon.country.clone()),
    })
}

/// 리퍼러를 origin + path로 축약
///
/// 절대 URL 파싱에 실패하면 절단된 원본 문자열로 폴백한다
/// (쿼리/프래그먼트가 남을 수 있지만 길이는 항상 제한됨).
fn sanitize_referrer(raw: &str) -> String {
    let truncated = truncate_chars(raw, MAX_REF_LEN);
    if truncated.is_empty() {
        return truncated;
    }
    match Url::parse(&truncated) {
        Ok(url) if url.has_host() => {
            format!("{}{}", url.origin().ascii_serialization(), url.path())
        }
        _ => truncated,
    }
}

/// 문자 단위 절단 (UTF-8 경계 안전)
fn truncate_chars(input: &str, max: usize) -> String {
    input.chars().take(max).collect()
}
