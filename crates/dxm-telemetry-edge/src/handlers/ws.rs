//! 푸시 채널(WebSocket) 핸드셰이크와 송신 펌프.
//!
//! 서버 → 클라이언트 단방향 채널. 인바운드 프레임은 연결 종료 감지를
//! 위해서만 읽고 내용은 무시한다.

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dxm_telemetry_hub::HubHandle;
use futures::{SinkExt, StreamExt};
use tracing::debug;

use crate::AppState;

/// 푸시 채널 업그레이드
///
/// GET /ws — Upgrade 헤더가 없으면 426
pub async fn upgrade(
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| pump(socket, state.hub)),
        Err(_) => (StatusCode::UPGRADE_REQUIRED, "Expected WebSocket").into_response(),
    }
}

/// 허브에 연결을 등록하고 송신 큐를 소켓으로 펌프
///
/// 어느 쪽이 끊겨도 조용히 등록 해제한다 — 개별 연결의 실패는
/// 인제스트 경로에 아무 영향을 주지 않는다.
async fn pump(socket: WebSocket, hub: HubHandle) {
    let Ok((id, mut rx)) = hub.register().await else {
        return;
    };
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(text) => {
                    if sink.send(Message::Text(text.as_ref().into())).await.is_err() {
                        break;
                    }
                }
                // 허브 쪽에서 연결이 정리됨 (송신 실패 등)
                None => break,
            },
            inbound = stream.next() => match inbound {
                // 단방향 채널: 수신 메시지는 무시
                Some(Ok(_)) => {}
                _ => break,
            },
        }
    }

    let _ = hub.unregister(id).await;
    debug!("푸시 연결 펌프 종료: id={id}");
}
