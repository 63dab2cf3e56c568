//! 라이브 푸시 연결 레지스트리와 팬아웃.
//!
//! 연결마다 송신 큐(`mpsc::Sender`)를 보관하고, 브로드캐스트는
//! 이벤트를 한 번만 직렬화한 뒤 모든 연결에 전달을 시도한다.
//! 전달 실패한 연결은 순회 중에 수집했다가 순회가 끝난 뒤 제거한다.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// 연결별 송신 큐 용량.
/// 큐가 가득 찬 느린 소비자는 끊어진 연결과 동일하게 정리된다.
pub const CONN_QUEUE_CAPACITY: usize = 64;

/// 연결 식별자
pub type ConnId = u64;

/// 라이브 연결 레지스트리
///
/// 허브 액터만 이 구조를 변경한다. 외부 컴포넌트는 핸들 API를 통해서만
/// 등록/해제를 요청할 수 있다.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnId, mpsc::Sender<Arc<str>>>,
    next_id: ConnId,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 핸드셰이크 완료된 연결 등록, 송신 큐의 수신단을 반환
    pub fn register(&mut self) -> (ConnId, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(CONN_QUEUE_CAPACITY);
        let id = self.next_id;
        self.next_id += 1;
        self.connections.insert(id, tx);
        debug!("푸시 연결 등록: id={id}, 총 {}개", self.connections.len());
        (id, rx)
    }

    /// 연결 제거 (close/error 시)
    pub fn unregister(&mut self, id: ConnId) {
        if self.connections.remove(&id).is_some() {
            debug!("푸시 연결 해제: id={id}, 총 {}개", self.connections.len());
        }
    }

    /// 직렬화된 메시지를 모든 라이브 연결에 팬아웃
    ///
    /// 개별 연결의 실패는 나머지 연결로의 전달을 중단시키지 않는다.
    /// 실패한 연결은 순회가 끝난 뒤에 제거한다(순회 중 변경 금지).
    pub fn broadcast(&mut self, message: Arc<str>) {
        let mut dead: Vec<ConnId> = Vec::new();

        for (&id, tx) in &self.connections {
            if tx.try_send(Arc::clone(&message)).is_err() {
                dead.push(id);
            }
        }

        for id in dead {
            self.connections.remove(&id);
            debug!("죽은 푸시 연결 정리: id={id}");
        }
    }

    /// 현재 라이브 연결 수
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(text: &str) -> Arc<str> {
        Arc::from(text)
    }

    #[test]
    fn register_unregister_lifecycle() {
        let mut registry = ConnectionRegistry::new();
        let (a, _rx_a) = registry.register();
        let (b, _rx_b) = registry.register();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);

        registry.unregister(a);
        assert_eq!(registry.len(), 1);
        // 중복 해제는 무해
        registry.unregister(a);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn broadcast_reaches_every_connection_once() {
        let mut registry = ConnectionRegistry::new();
        let (_a, mut rx_a) = registry.register();
        let (_b, mut rx_b) = registry.register();

        registry.broadcast(msg("{\"path\":\"/gpus\"}"));

        assert_eq!(&*rx_a.recv().await.unwrap(), "{\"path\":\"/gpus\"}");
        assert_eq!(&*rx_b.recv().await.unwrap(), "{\"path\":\"/gpus\"}");
        // 정확히 1부씩
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_connection_pruned_and_skipped() {
        let mut registry = ConnectionRegistry::new();
        let (_a, rx_a) = registry.register();
        let (_b, mut rx_b) = registry.register();

        drop(rx_a); // 연결 종료 시뮬레이션

        registry.broadcast(msg("ev"));

        // 살아있는 쪽은 수신, 죽은 쪽은 레지스트리에서 제거됨
        assert_eq!(&*rx_b.recv().await.unwrap(), "ev");
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn slow_consumer_with_full_queue_pruned() {
        let mut registry = ConnectionRegistry::new();
        let (_a, _rx_a) = registry.register();

        for i in 0..=CONN_QUEUE_CAPACITY {
            registry.broadcast(msg(&format!("ev{i}")));
        }
        // 큐 용량 초과분에서 전달 실패 → 정리
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn one_dead_connection_does_not_block_others() {
        let mut registry = ConnectionRegistry::new();
        let (_a, rx_a) = registry.register();
        let (_b, mut rx_b) = registry.register();
        let (_c, mut rx_c) = registry.register();
        drop(rx_a);

        registry.broadcast(msg("ev"));

        assert!(rx_b.try_recv().is_ok());
        assert!(rx_c.try_recv().is_ok());
        assert_eq!(registry.len(), 2);
    }
}
