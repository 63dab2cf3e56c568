//! # dxm-telemetry-node
//!
//! DXM 텔레메트리 노드 바이너리 진입점.
//! 허브 액터, 엣지 서버, 생존 프로버를 와이어링하고 라이프사이클을
//! 관리한다.

mod prober;

use anyhow::Result;
use clap::Parser;
use dxm_telemetry_core::config::NodeConfig;
use dxm_telemetry_edge::EdgeServer;
use dxm_telemetry_hub::HubHandle;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::prober::Prober;

/// DXM 텔레메트리 노드
///
/// 페이지뷰 비콘 인제스트 + 실시간 WebSocket 브로드캐스트 허브
#[derive(Parser, Debug)]
#[command(name = "dxm-telemetry-node")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 바인드 호스트 (기본: 환경변수 또는 127.0.0.1)
    #[arg(long)]
    host: Option<String>,

    /// 바인드 포트 (기본: 환경변수 또는 8787)
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// 허용 origin (기본: 환경변수 ALLOWED_ORIGIN)
    #[arg(long)]
    allowed_origin: Option<String>,

    /// 분 단위 집계 보존 윈도우 (0 = 집계 안 함)
    #[arg(long)]
    retention_min: Option<u32>,

    /// 알림 웹훅 URL (기본: 환경변수 TELEMETRY_ALERT_WEBHOOK_URL)
    #[arg(long)]
    alert_webhook: Option<String>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

/// 환경변수 설정 위에 CLI 인자를 덮어쓴다
fn resolve_config(args: &Args) -> NodeConfig {
    let mut config = NodeConfig::from_env();
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(origin) = &args.allowed_origin {
        config.allowed_origin = origin.clone();
    }
    if let Some(min) = args.retention_min {
        config.retention_min = min;
    }
    if let Some(url) = &args.alert_webhook {
        config.alert_webhook_url = Some(url.clone());
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_level.clone())),
        )
        .init();

    let config = resolve_config(&args);
    info!(
        "설정: origin={}, 보존={}분, 알림={}",
        config.allowed_origin,
        config.retention_min,
        if config.alerting_enabled() { "활성" } else { "비활성" }
    );

    // 허브 액터 — 모든 공유 상태의 단일 소유자
    let hub = HubHandle::spawn(config.retention_min);

    // 종료 신호 채널 (ctrl-c → 전체 전파)
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("종료 신호(ctrl-c) 수신");
            let _ = shutdown_tx.send(true);
        }
    });

    // 생존 프로버 — 요청 경로와 완전히 분리된 독립 타이머
    let prober = Prober::new(hub.clone(), config.alert_webhook_url.clone());
    tokio::spawn(prober.run(shutdown_rx.clone()));

    // 엣지 서버 (블로킹 실행)
    let server = EdgeServer::new(hub, config);
    if let Err(e) = server.run(shutdown_rx).await {
        error!("엣지 서버 에러: {e}");
        return Err(e.into());
    }

    info!("텔레메트리 노드 종료");
    Ok(())
}
