//! # dxm-telemetry-hub
//!
//! 텔레메트리 허브 — 상태를 소유하는 단일 액터 코디네이터.
//!
//! 레이트 리밋 버킷, 분 단위 집계, 연결 레지스트리는 전부 허브 태스크
//! 하나가 소유하며, 모든 연산은 mpsc 메일박스를 통해 도착 순서대로
//! 하나씩 처리된다. 락 없이 직렬화된 접근을 보장하는 것이 이 crate의
//! 핵심 불변식이다.
//!
//! ## 구조
//!
//! - [`rate_limit`] — 클라이언트별 토큰 버킷
//! - [`aggregate`] — 분 단위 롤링 집계
//! - [`registry`] — 라이브 푸시 연결 레지스트리와 팬아웃
//! - [`HubHandle`] — 메일박스 송신단을 감싼 외부 API

pub mod aggregate;
pub mod rate_limit;
pub mod registry;

use aggregate::{MinuteAggregator, MinuteSnapshot};
use dxm_telemetry_core::TelemetryEvent;
use rate_limit::RateLimiter;
use registry::{ConnId, ConnectionRegistry};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

/// 허브 메일박스 용량
const HUB_MAILBOX_CAPACITY: usize = 1024;

/// 허브 에러
#[derive(Debug, Error)]
pub enum HubError {
    /// 허브 태스크가 종료되어 연산을 처리할 수 없음
    #[error("허브를 사용할 수 없음")]
    Unavailable,
}

/// 인제스트 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// 수락 — 집계·브로드캐스트까지 완료
    Accepted,
    /// 레이트 리밋으로 샘플링 아웃 (에러 아님)
    SampledOut,
}

/// 상태 프로브 응답
#[derive(Debug, Clone)]
pub struct HubStatus {
    /// 허브 응답 여부
    pub ok: bool,
    /// 현재 라이브 푸시 연결 수
    pub sockets: usize,
}

/// 허브 메일박스 명령
enum HubCommand {
    Ingest {
        event: TelemetryEvent,
        reply: oneshot::Sender<IngestOutcome>,
    },
    Register {
        reply: oneshot::Sender<(ConnId, mpsc::Receiver<Arc<str>>)>,
    },
    Unregister {
        id: ConnId,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<MinuteSnapshot>>,
    },
    Status {
        reply: oneshot::Sender<HubStatus>,
    },
}

/// 허브 액터 내부 상태.
/// 허브 태스크 외부에서는 절대 접근하지 않는다.
struct TelemetryHub {
    rate_limiter: RateLimiter,
    aggregator: MinuteAggregator,
    registry: ConnectionRegistry,
}

impl TelemetryHub {
    fn new(retention_min: u32) -> Self {
        Self {
            rate_limiter: RateLimiter::new(),
            aggregator: MinuteAggregator::new(retention_min),
            registry: ConnectionRegistry::new(),
        }
    }

    fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Ingest { event, reply } => {
                let outcome = self.ingest(event);
                let _ = reply.send(outcome);
            }
            HubCommand::Register { reply } => {
                let _ = reply.send(self.registry.register());
            }
            HubCommand::Unregister { id } => {
                self.registry.unregister(id);
            }
            HubCommand::Snapshot { reply } => {
                let _ = reply.send(self.aggregator.snapshot());
            }
            HubCommand::Status { reply } => {
                // 프로브는 레이트 리밋/집계 상태에 부작용이 없어야 한다
                let _ = reply.send(HubStatus {
                    ok: true,
                    sockets: self.registry.len(),
                });
            }
        }
    }

    /// 레이트 리밋 → (조건부) 집계 → 브로드캐스트.
    /// 레이트 리밋 거부는 뒤 단계를 건너뛴다.
    fn ingest(&mut self, event: TelemetryEvent) -> IngestOutcome {
        if !self.rate_limiter.try_consume(&event.ua_hash, event.ts) {
            debug!("레이트 리밋 초과, 샘플링 아웃: ua_hash={}", event.ua_hash);
            return IngestOutcome::SampledOut;
        }

        self.aggregator.record(&event);

        match serde_json::to_string(&event) {
            Ok(json) => self.registry.broadcast(Arc::from(json.as_str())),
            Err(e) => error!("이벤트 직렬화 실패, 브로드캐스트 생략: {e}"),
        }

        IngestOutcome::Accepted
    }
}

/// 허브 핸들 — 메일박스 송신단 래퍼
///
/// 복제 가능하며, 허브 태스크가 내려간 경우 모든 연산이
/// `HubError::Unavailable`로 완화된다(패닉 없음).
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// 허브 태스크를 띄우고 핸들 반환
    pub fn spawn(retention_min: u32) -> Self {
        let (tx, mut rx) = mpsc::channel(HUB_MAILBOX_CAPACITY);
        tokio::spawn(async move {
            let mut hub = TelemetryHub::new(retention_min);
            info!("텔레메트리 허브 시작 (보존: {retention_min}분)");
            while let Some(command) = rx.recv().await {
                hub.handle(command);
            }
            info!("텔레메트리 허브 종료");
        });
        Self { tx }
    }

    async fn request<T>(
        &self,
        command: HubCommand,
        rx: oneshot::Receiver<T>,
    ) -> Result<T, HubError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| HubError::Unavailable)?;
        rx.await.map_err(|_| HubError::Unavailable)
    }

    /// 정규화된 이벤트 1건 인제스트
    pub async fn ingest(&self, event: TelemetryEvent) -> Result<IngestOutcome, HubError> {
        let (reply, rx) = oneshot::channel();
        self.request(HubCommand::Ingest { event, reply }, rx).await
    }

    /// 푸시 연결 등록 — 송신 큐의 수신단을 돌려받는다
    pub async fn register(&self) -> Result<(ConnId, mpsc::Receiver<Arc<str>>), HubError> {
        let (reply, rx) = oneshot::channel();
        self.request(HubCommand::Register { reply }, rx).await
    }

    /// 푸시 연결 해제
    pub async fn unregister(&self, id: ConnId) -> Result<(), HubError> {
        self.tx
            .send(HubCommand::Unregister { id })
            .await
            .map_err(|_| HubError::Unavailable)
    }

    /// 분 단위 집계 스냅샷 (오름차순)
    pub async fn snapshot(&self) -> Result<Vec<MinuteSnapshot>, HubError> {
        let (reply, rx) = oneshot::channel();
        self.request(HubCommand::Snapshot { reply }, rx).await
    }

    /// 경량 상태 프로브 (부작용 없음)
    pub async fn status(&self) -> Result<HubStatus, HubError> {
        let (reply, rx) = oneshot::channel();
        self.request(HubCommand::Status { reply }, rx).await
    }
}
