//! 노드 런타임 설정.
//!
//! 허용 origin, 알림 웹훅 URL, 분 단위 보존 윈도우 등을 환경변수에서
//! 로드한다. 웹훅 URL이 없으면 알림이 비활성화되고, 보존 윈도우가
//! 없으면(0) 집계가 비활성화된다.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// 허용 origin 환경변수
const ENV_ALLOWED_ORIGIN: &str = "ALLOWED_ORIGIN";

/// 알림 웹훅 URL 환경변수 (옵션)
const ENV_ALERT_WEBHOOK_URL: &str = "TELEMETRY_ALERT_WEBHOOK_URL";

/// 분 단위 집계 보존 윈도우 환경변수 (옵션, 0 = 집계 안 함)
const ENV_PERSIST_MIN: &str = "TELEMETRY_PERSIST_MIN";

/// 바인드 주소 환경변수
const ENV_BIND_HOST: &str = "TELEMETRY_BIND_HOST";

/// 바인드 포트 환경변수
const ENV_BIND_PORT: &str = "TELEMETRY_BIND_PORT";

/// 노드 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// 바인드 호스트
    #[serde(default = "default_host")]
    pub host: String,
    /// 바인드 포트
    #[serde(default = "default_port")]
    pub port: u16,
    /// 허용 origin (프로덕션 대시보드)
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
    /// 알림 웹훅 URL — 없으면 알림 비활성화
    #[serde(default)]
    pub alert_webhook_url: Option<String>,
    /// 분 단위 집계 보존 윈도우 — 0이면 집계 비활성화
    #[serde(default)]
    pub retention_min: u32,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_allowed_origin() -> String {
    "https://dxm369.com".to_string()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origin: default_allowed_origin(),
            alert_webhook_url: None,
            retention_min: 0,
        }
    }
}

impl NodeConfig {
    /// 환경변수에서 설정 로드
    ///
    /// 미설정 항목은 기본값을 쓴다. 파싱 불가능한 숫자 값은 경고 후
    /// 기본값으로 대체한다 — 설정 오류로 노드가 내려가면 안 된다.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(origin) = std::env::var(ENV_ALLOWED_ORIGIN) {
            if !origin.is_empty() {
                config.allowed_origin = origin;
            }
        }
        config.alert_webhook_url = std::env::var(ENV_ALERT_WEBHOOK_URL)
            .ok()
            .filter(|url| !url.is_empty());
        if let Ok(raw) = std::env::var(ENV_PERSIST_MIN) {
            match raw.parse::<u32>() {
                Ok(min) => config.retention_min = min,
                Err(_) => warn!("{ENV_PERSIST_MIN} 파싱 실패: {raw:?}, 집계 비활성화"),
            }
        }
        if let Ok(host) = std::env::var(ENV_BIND_HOST) {
            if !host.is_empty() {
                config.host = host;
            }
        }
        if let Ok(raw) = std::env::var(ENV_BIND_PORT) {
            match raw.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(_) => warn!("{ENV_BIND_PORT} 파싱 실패: {raw:?}, 기본 포트 사용"),
            }
        }

        config
    }

    /// 집계 활성화 여부
    pub fn aggregation_enabled(&self) -> bool {
        self.retention_min > 0
    }

    /// 알림 활성화 여부
    pub fn alerting_enabled(&self) -> bool {
        self.alert_webhook_url.is_some()
    }
}
