//! Origin 허용 정책.
//!
//! 설정된 프로덕션 origin, 고정 보조 origin, 로컬 개발 origin만
//! 허용한다. 허용 목록에 없는 요청은 에러가 아니라 "샘플링 아웃"으로
//! 처리된다 — 프로빙 클라이언트에게 허용 목록을 노출하지 않기 위함.

use std::sync::Arc;
use url::Url;

/// 고정 보조 프로덕션 origin (www 서브도메인)
pub const SECONDARY_ORIGIN: &str = "https://www.dxm369.com";

/// 로컬 개발 origin 접두사
const LOCAL_PREFIXES: [&str; 2] = ["http://localhost:", "http://127.0.0.1:"];

/// Origin 허용 정책
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed_origin: Arc<str>,
}

impl OriginPolicy {
    pub fn new(allowed_origin: &str) -> Self {
        Self {
            allowed_origin: Arc::from(allowed_origin),
        }
    }

    /// 단일 origin 문자열 허용 여부
    pub fn is_allowed(&self, origin: &str) -> bool {
        if origin.is_empty() {
            return false;
        }
        origin == &*self.allowed_origin
            || origin == SECONDARY_ORIGIN
            || LOCAL_PREFIXES.iter().any(|p| origin.starts_with(p))
    }

    /// 인제스트 요청 허용 여부
    ///
    /// `Origin` 헤더를 먼저 검사하고, 불허/부재 시 `Referer`의 origin으로
    /// 폴백한다 (비콘 전송 방식에 따라 Origin이 빠질 수 있음).
    pub fn ingest_allowed(&self, origin: Option<&str>, referer: Option<&str>) -> bool {
        if origin.is_some_and(|o| self.is_allowed(o)) {
            return true;
        }
        referer
            .and_then(|r| Url::parse(r).ok())
            .is_some_and(|url| self.is_allowed(&url.origin().ascii_serialization()))
    }
}
