//! # dxm-telemetry-edge
//!
//! 공개 네트워크에서 직접 도달 가능한 유일한 컴포넌트.
//! Axum 기반 HTTP 수신면 + WebSocket 푸시 채널 핸드셰이크.
//!
//! ## 엔드포인트
//! - `POST /ingest` — 비콘 수신 (origin 검사, 소프트 거부)
//! - `GET /ws` — 푸시 채널 업그레이드
//! - `GET /metrics/minute` — 집계 스냅샷
//! - `GET /healthz` — 프로세스 생존 확인
//!
//! 핸들러 레이어 자체는 공유 가변 상태를 갖지 않는다. 모든 상태는
//! [`dxm_telemetry_hub`]의 허브 액터가 소유한다.

pub mod error;
pub mod handlers;
pub mod origin;
pub mod routes;

use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::Router;
use dxm_telemetry_core::config::NodeConfig;
use dxm_telemetry_hub::HubHandle;
use origin::OriginPolicy;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// 엣지 서버 애플리케이션 상태
#[derive(Clone)]
pub struct AppState {
    /// 허브 핸들 (코디네이터 메일박스)
    pub hub: HubHandle,
    /// origin 허용 정책
    pub policy: OriginPolicy,
}

/// 엣지 서버
pub struct EdgeServer {
    config: NodeConfig,
    state: AppState,
}

impl EdgeServer {
    /// 새 엣지 서버 생성
    pub fn new(hub: HubHandle, config: NodeConfig) -> Self {
        let policy = OriginPolicy::new(&config.allowed_origin);
        Self {
            config,
            state: AppState { hub, policy },
        }
    }

    /// 전체 미들웨어가 적용된 라우터 생성 (테스트에서도 사용)
    pub fn router(&self) -> Router {
        let policy = self.state.policy.clone();
        // 프리플라이트(OPTIONS)는 CORS 레이어가 본문 없이 즉시 응답한다
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::predicate(move |origin, _| {
                origin.to_str().is_ok_and(|o| policy.is_allowed(o))
            }))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE]);

        routes::routes()
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// 서버 실행
    ///
    /// # Arguments
    /// * `shutdown_rx` — 종료 신호 수신 채널
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), std::io::Error> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let app = self.router();
        let listener = TcpListener::bind(addr).await?;
        info!("텔레메트리 엣지 서버 시작: http://{addr}");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                loop {
                    if *shutdown_rx.borrow() {
                        info!("엣지 서버 종료 신호 수신");
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
            })
            .await?;

        info!("텔레메트리 엣지 서버 종료");
        Ok(())
    }
}
