//! 비콘/이벤트 데이터 구조체.
//!
//! `RawBeacon`은 신뢰할 수 없는 와이어 입력, `TelemetryEvent`는
//! 새니타이저를 거친 불변 레코드다. 와이어 필드명은 기존 대시보드
//! 클라이언트와의 호환을 위해 camelCase(`uaHash`, `ipHash`)를 유지한다.

use serde::{Deserialize, Serialize};

/// 브라우저가 전송하는 원시 비콘.
///
/// 모든 필드가 serde 수준에서 선택적이다 — `path` 누락은 역직렬화
/// 에러가 아니라 도메인 에러(400)로 처리해야 하기 때문.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBeacon {
    /// 페이지 경로 (필수 — 새니타이저에서 검증)
    #[serde(default)]
    pub path: Option<String>,
    /// 리퍼러 URL
    #[serde(rename = "ref", default)]
    pub referrer: Option<String>,
    /// 클라이언트 측에서 미리 해시한 UA 식별자
    #[serde(rename = "uaHash", default)]
    pub ua_hash: Option<String>,
    /// 국가 코드 (엣지 힌트가 없을 때의 폴백)
    #[serde(default)]
    pub country: Option<String>,
}

/// 정규화된 텔레메트리 이벤트.
///
/// 생성 후 불변. 집계와 브로드캐스트가 소비하며, 보존 윈도우 밖에는
/// 어디에도 저장되지 않는다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// 서버 타임스탬프 (epoch ms)
    pub ts: i64,
    /// 쿼리 제거·절단된 페이지 경로
    pub path: String,
    /// origin + path로 축약된 리퍼러 (없으면 빈 문자열)
    #[serde(rename = "ref")]
    pub referrer: String,
    /// 클라이언트 식별자 해시 (없으면 빈 문자열 — 익명)
    #[serde(rename = "uaHash")]
    pub ua_hash: String,
    /// 접속 IP의 DJB2 해시
    #[serde(rename = "ipHash", skip_serializing_if = "Option::is_none")]
    pub ip_hash: Option<String>,
    /// 국가 코드
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beacon_deserializes_with_missing_fields() {
        let beacon: RawBeacon = serde_json::from_str("{}").unwrap();
        assert!(beacon.path.is_none());
        assert!(beacon.ua_hash.is_none());
    }

    #[test]
    fn beacon_wire_names() {
        let beacon: RawBeacon =
            serde_json::from_str(r#"{"path":"/gpus","ref":"https://a.com/","uaHash":"ab12"}"#)
                .unwrap();
        assert_eq!(beacon.path.as_deref(), Some("/gpus"));
        assert_eq!(beacon.referrer.as_deref(), Some("https://a.com/"));
        assert_eq!(beacon.ua_hash.as_deref(), Some("ab12"));
    }

    #[test]
    fn event_omits_absent_optionals() {
        let event = TelemetryEvent {
            ts: 1_700_000_000_000,
            path: "/gpus".to_string(),
            referrer: String::new(),
            ua_hash: "ab12".to_string(),
            ip_hash: None,
            country: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"uaHash\":\"ab12\""));
        assert!(!json.contains("ipHash"));
        assert!(!json.contains("country"));
    }
}
