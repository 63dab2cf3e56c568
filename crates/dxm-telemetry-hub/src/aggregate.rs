//! 분 단위 롤링 집계.
//!
//! 분 경계에 정렬된 버킷에 total / byPath / byCountry 카운터를
//! 유지한다. 매 기록마다 보존 윈도우 밖의 버킷을 축출하므로 메모리는
//! 이벤트량과 무관하게 `O(retention_min)`으로 제한된다.

use dxm_telemetry_core::TelemetryEvent;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// 분 → ms 변환 계수
const MINUTE_MS: i64 = 60_000;

/// 단일 분 버킷 카운터
#[derive(Debug, Default, Clone)]
struct MinuteBucket {
    total: u64,
    by_path: HashMap<String, u64>,
    by_country: HashMap<String, u64>,
}

/// 메트릭 스냅샷 항목 (버킷 하나, 와이어 DTO)
#[derive(Debug, Clone, Serialize)]
pub struct MinuteSnapshot {
    /// 버킷 시작 시각 (분 경계, epoch ms)
    pub ts: i64,
    /// 전체 이벤트 수
    pub total: u64,
    /// 경로별 카운트
    #[serde(rename = "byPath")]
    pub by_path: HashMap<String, u64>,
    /// 국가별 카운트
    #[serde(rename = "byCountry")]
    pub by_country: HashMap<String, u64>,
}

/// 분 단위 집계기
///
/// `retention_min == 0`이면 집계는 완전히 비활성화된다(옵트인).
#[derive(Debug)]
pub struct MinuteAggregator {
    retention_min: u32,
    buckets: BTreeMap<i64, MinuteBucket>,
}

impl MinuteAggregator {
    pub fn new(retention_min: u32) -> Self {
        Self {
            retention_min,
            buckets: BTreeMap::new(),
        }
    }

    /// 이벤트 1건 기록 후 오래된 버킷 축출
    pub fn record(&mut self, event: &TelemetryEvent) {
        if self.retention_min == 0 {
            return;
        }

        let minute_ts = event.ts.div_euclid(MINUTE_MS) * MINUTE_MS;
        let bucket = self.buckets.entry(minute_ts).or_default();
        bucket.total += 1;
        *bucket.by_path.entry(event.path.clone()).or_insert(0) += 1;
        if let Some(country) = &event.country {
            *bucket.by_country.entry(country.clone()).or_insert(0) += 1;
        }

        // 보존 2분이면 현재 분 포함 정확히 2개 버킷만 남는다
        let cutoff = minute_ts - i64::from(self.retention_min) * MINUTE_MS;
        self.buckets.retain(|&ts, _| ts > cutoff);
    }

    /// 현재 버킷들을 타임스탬프 오름차순으로 반환
    pub fn snapshot(&self) -> Vec<MinuteSnapshot> {
        self.buckets
            .iter()
            .map(|(&ts, bucket)| MinuteSnapshot {
                ts,
                total: bucket.total,
                by_path: bucket.by_path.clone(),
                by_country: bucket.by_country.clone(),
            })
            .collect()
    }
}
