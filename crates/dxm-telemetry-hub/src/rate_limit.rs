//! 클라이언트별 토큰 버킷 레이트 리미터.
//!
//! `ua_hash`를 키로 하는 버킷 맵. 리필은 버킷을 다음에 만질 때
//! 경과한 "완전한" 윈도우 수만큼만 지연 계산한다 — `last_refill`을
//! 정확히 그만큼만 전진시켜 남은 소수 시간이 다음 리필로 이월된다.

use std::collections::HashMap;

/// 리필 윈도우 (ms)
const WINDOW_MS: i64 = 10_000;

/// 버킷 최대 토큰 (버스트 허용량)
const MAX_TOKENS: f64 = 50.0;

/// 윈도우당 리필 토큰 수 (soft limit: 10 events/10s)
const RATE_PER_WINDOW: f64 = 10.0;

/// 클라이언트별 토큰 버킷
#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: i64,
}

impl TokenBucket {
    fn full(now_ms: i64) -> Self {
        Self {
            tokens: MAX_TOKENS,
            last_refill: now_ms,
        }
    }

    /// 경과한 완전 윈도우 수만큼 지연 리필
    fn refill(&mut self, now_ms: i64) {
        let elapsed = now_ms - self.last_refill;
        if elapsed <= 0 {
            return;
        }
        let windows = elapsed / WINDOW_MS;
        if windows > 0 {
            self.tokens = (self.tokens + windows as f64 * RATE_PER_WINDOW).min(MAX_TOKENS);
            self.last_refill += windows * WINDOW_MS;
        }
    }
}

/// 클라이언트별 레이트 리미터
///
/// 버킷 맵은 의도적으로 절대 비우지 않는다(레퍼런스 설계와 동일).
/// 고유 클라이언트가 계속 유입되면 무한히 자랄 수 있는 알려진
/// 한계이며, 강화가 필요해지면 시간 기반 축출이 이 자리에 들어간다.
#[derive(Debug, Default)]
pub struct RateLimiter {
    buckets: HashMap<String, TokenBucket>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 토큰 1개 소비 시도
    ///
    /// 해시가 빈 익명 클라이언트는 리미터를 우회한다(문서화된 정책).
    /// 거부는 에러가 아니라 정상적인 정책 결과다.
    pub fn try_consume(&mut self, ua_hash: &str, now_ms: i64) -> bool {
        if ua_hash.is_empty() {
            return true;
        }

        let bucket = self
            .buckets
            .entry(ua_hash.to_string())
            .or_insert_with(|| TokenBucket::full(now_ms));
        bucket.refill(now_ms);

        if bucket.tokens < 1.0 {
            return false;
        }
        bucket.tokens -= 1.0;
        true
    }

    /// 추적 중인 클라이언트 수 (상태 프로브용)
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    #[test]
    fn anonymous_bypasses_limiter() {
        let mut limiter = RateLimiter::new();
        for _ in 0..1000 {
            assert!(limiter.try_consume("", T0));
        }
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn burst_of_max_tokens_allowed_then_denied() {
        let mut limiter = RateLimiter::new();
        for i in 0..50 {
            assert!(limiter.try_consume("ab12", T0), "요청 {i} 거부됨");
        }
        // 51번째는 같은 윈도우 안에서 거부
        assert!(!limiter.try_consume("ab12", T0));
    }

    #[test]
    fn refill_after_one_window() {
        let mut limiter = RateLimiter::new();
        for _ in 0..50 {
            limiter.try_consume("ab12", T0);
        }
        assert!(!limiter.try_consume("ab12", T0 + WINDOW_MS - 1));
        // 윈도우 하나가 지나면 10개 리필
        for _ in 0..10 {
            assert!(limiter.try_consume("ab12", T0 + WINDOW_MS));
        }
        assert!(!limiter.try_consume("ab12", T0 + WINDOW_MS));
    }

    #[test]
    fn fractional_windows_carry_over() {
        let mut limiter = RateLimiter::new();
        for _ in 0..50 {
            limiter.try_consume("ab12", T0);
        }
        // 1.5 윈도우 경과 → 1 윈도우만 리필, 나머지 0.5는 이월
        for _ in 0..10 {
            assert!(limiter.try_consume("ab12", T0 + WINDOW_MS * 3 / 2));
        }
        assert!(!limiter.try_consume("ab12", T0 + WINDOW_MS * 3 / 2));
        // 이월분 0.5 + 0.5 윈도우 = 완전한 윈도우 하나
        assert!(limiter.try_consume("ab12", T0 + WINDOW_MS * 2));
    }

    #[test]
    fn tokens_capped_at_max() {
        let mut limiter = RateLimiter::new();
        limiter.try_consume("ab12", T0);
        // 오랜 시간 경과 후에도 최대치를 넘지 않음: 50개 초과 소비 불가
        let later = T0 + WINDOW_MS * 1000;
        let mut allowed = 0;
        while limiter.try_consume("ab12", later) {
            allowed += 1;
            assert!(allowed <= 50, "버킷이 최대치를 초과함");
        }
        assert_eq!(allowed, 50);
    }

    #[test]
    fn clock_regression_is_harmless() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.try_consume("ab12", T0));
        // 시계가 뒤로 가도 패닉/음수 리필 없음
        assert!(limiter.try_consume("ab12", T0 - WINDOW_MS));
    }

    #[test]
    fn clients_are_independent() {
        let mut limiter = RateLimiter::new();
        for _ in 0..50 {
            limiter.try_consume("ab12", T0);
        }
        assert!(!limiter.try_consume("ab12", T0));
        assert!(limiter.try_consume("cd34", T0));
        assert_eq!(limiter.tracked_clients(), 2);
    }
}
