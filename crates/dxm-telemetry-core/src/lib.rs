//! # dxm-telemetry-core
//!
//! DXM 텔레메트리 노드의 도메인 모델과 공통 타입.
//! 순수 로직만 포함하며 비동기/IO 의존성이 없다.
//!
//! ## 구조
//!
//! - [`event`] — 비콘/이벤트 데이터 구조체 (serde Serialize/Deserialize)
//! - [`sanitize`] — 신뢰할 수 없는 비콘의 정규화
//! - [`hash`] — 비가역 식별자용 DJB2 해시
//! - [`error`] — 핵심 에러 타입 (thiserror)
//! - [`config`] — 노드 런타임 설정 (환경변수 로드)

pub mod config;
pub mod error;
pub mod event;
pub mod hash;
pub mod sanitize;

pub use error::CoreError;
pub use event::{RawBeacon, TelemetryEvent};
