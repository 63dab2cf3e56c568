//! HTTP 핸들러 모듈.

pub mod health;
pub mod ingest;
pub mod metrics;
pub mod ws;
