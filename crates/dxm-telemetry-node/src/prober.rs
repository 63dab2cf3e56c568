//! 허브 생존 프로브와 알림 루프.
//!
//! 독립 타이머로 허브 상태를 확인하고, 연속 실패가 임계값에 도달하면
//! 외부 웹훅으로 알림을 1회 발송한 뒤 카운터를 리셋한다 — 지속 장애는
//! 알림 폭주가 아니라 임계값 통과마다 한 건씩만 만든다. 프로브가
//! 느리거나 실패해도 인제스트/브로드캐스트 경로는 영향받지 않는다.

use chrono::Utc;
use dxm_telemetry_hub::HubHandle;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// 프로브 주기
pub const PROBE_INTERVAL: Duration = Duration::from_secs(60);

/// 알림 발송 임계값 (연속 실패 수)
const FAILURE_THRESHOLD: u32 = 2;

/// 단일 프로브의 연속 실패 카운터.
///
/// 상태 전이: ok → counting → (임계값 도달) alerted → ok.
#[derive(Debug, Default)]
pub struct ProbeState {
    consecutive_failures: u32,
}

impl ProbeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 프로브 결과 반영. 알림을 발송해야 하면 true.
    ///
    /// 성공은 카운터를 0으로 리셋한다. 임계값 도달 시에도 리셋하므로
    /// 다음 알림까지는 다시 연속 실패 임계값만큼이 필요하다.
    pub fn on_result(&mut self, ok: bool) -> bool {
        if ok {
            self.consecutive_failures = 0;
            return false;
        }
        self.consecutive_failures += 1;
        if self.consecutive_failures >= FAILURE_THRESHOLD {
            self.consecutive_failures = 0;
            return true;
        }
        false
    }
}

/// 알림 웹훅 페이로드
#[derive(Debug, Serialize)]
struct AlertPayload {
    ts: String,
    probe: &'static str,
    reason: &'static str,
    failures: u32,
}

/// 생존 프로버
///
/// 생존(healthz)과 푸시 채널 수용 능력(ws_connect) 두 카운터를
/// 독립적으로 유지한다.
pub struct Prober {
    hub: HubHandle,
    webhook_url: Option<String>,
    http: reqwest::Client,
    healthz: ProbeState,
    ws_ready: ProbeState,
}

impl Prober {
    /// 새 프로버 생성. 웹훅 URL이 없으면 알림은 조용히 비활성화된다.
    pub fn new(hub: HubHandle, webhook_url: Option<String>) -> Self {
        Self {
            hub,
            webhook_url,
            http: reqwest::Client::new(),
            healthz: ProbeState::new(),
            ws_ready: ProbeState::new(),
        }
    }

    /// 프로브 루프 실행 (종료 신호까지)
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(PROBE_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.probe_once().await,
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        debug!("프로버 종료 신호 수신");
                        break;
                    }
                }
            }
        }
    }

    /// 프로브 1회 수행 후 필요 시 알림 발송
    async fn probe_once(&mut self) {
        let ok = match self.hub.status().await {
            Ok(status) => status.ok,
            Err(_) => false,
        };
        // 허브가 응답하면 푸시 채널도 수용 가능한 것으로 간주 (대리 지표)
        let ws_ok = ok;

        if self.healthz.on_result(ok) {
            self.dispatch("healthz", "hub_status_failed_consecutive")
                .await;
        }
        if self.ws_ready.on_result(ws_ok) {
            self.dispatch("ws_connect", "ws_proxy_failed_consecutive")
                .await;
        }
    }

    /// 알림 발송 (fire-and-forget)
    ///
    /// 발송 자체의 실패는 삼킨다 — 알림 경로의 장애가 또 다른 장애를
    /// 연쇄시키면 안 된다.
    async fn dispatch(&self, probe: &'static str, reason: &'static str) {
        let Some(url) = &self.webhook_url else {
            return;
        };
        let payload = AlertPayload {
            ts: Utc::now().to_rfc3339(),
            probe,
            reason,
            failures: FAILURE_THRESHOLD,
        };
        warn!("프로브 알림 발송: probe={probe}, reason={reason}");
        if let Err(e) = self.http.post(url).json(&payload).send().await {
            warn!("알림 웹훅 발송 실패 (무시): {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_resets_counter() {
        let mut state = ProbeState::new();
        assert!(!state.on_result(false));
        assert!(!state.on_result(true));
        // 리셋 후 다시 연속 2회 실패가 필요
        assert!(!state.on_result(false));
        assert!(state.on_result(false));
    }

    #[test]
    fn two_consecutive_failures_alert_once() {
        let mut state = ProbeState::new();
        assert!(!state.on_result(false));
        assert!(state.on_result(false));
        // 알림 직후 즉시 실패해도 임계값을 다시 채우기 전에는 알림 없음
        assert!(!state.on_result(false));
        assert!(state.on_result(false));
    }

    #[test]
    fn sustained_outage_alerts_per_threshold_crossing() {
        let mut state = ProbeState::new();
        let alerts = (0..10).filter(|_| state.on_result(false)).count();
        assert_eq!(alerts, 5);
    }

    #[tokio::test]
    async fn alert_dispatch_posts_json_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/alert")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "probe": "healthz",
                "failures": 2,
            })))
            .with_status(200)
            .create_async()
            .await;

        let prober = Prober::new(
            HubHandle::spawn(0),
            Some(format!("{}/alert", server.url())),
        );
        prober
            .dispatch("healthz", "hub_status_failed_consecutive")
            .await;

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn dispatch_failure_is_swallowed() {
        // 연결 불가능한 주소 — 에러가 전파되지 않아야 함
        let prober = Prober::new(
            HubHandle::spawn(0),
            Some("http://127.0.0.1:1/alert".to_string()),
        );
        prober.dispatch("healthz", "test_unreachable").await;
    }

    #[tokio::test]
    async fn missing_webhook_disables_alerting() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/alert")
            .expect(0)
            .create_async()
            .await;

        let prober = Prober::new(HubHandle::spawn(0), None);
        prober.dispatch("healthz", "test_disabled").await;

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn healthy_hub_never_alerts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/alert")
            .expect(0)
            .create_async()
            .await;

        let mut prober = Prober::new(
            HubHandle::spawn(0),
            Some(format!("{}/alert", server.url())),
        );
        for _ in 0..5 {
            prober.probe_once().await;
        }

        mock.assert_async().await;
    }
}
