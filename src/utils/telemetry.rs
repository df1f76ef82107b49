//! Scan telemetry
//!
//! Process-local counters for monitoring: jobs by outcome and how often
//! each adapter actually answered. No entity identifiers are kept.

use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::types::SourceStatus;

#[derive(Debug, Default)]
pub struct ScanTelemetry {
    submitted: AtomicU64,
    deduplicated: AtomicU64,
    cache_served: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    total_scan_ms: AtomicU64,
    adapters: DashMap<String, AdapterCounters>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AdapterCounters {
    pub available: u64,
    pub unavailable: u64,
}

/// Snapshot for `/v1/stats`
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryStats {
    pub jobs_submitted: u64,
    pub jobs_deduplicated: u64,
    pub jobs_served_from_cache: u64,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
    pub avg_scan_ms: f64,
    pub adapters: BTreeMap<String, AdapterCounters>,
}

impl ScanTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deduplicated(&self) {
        self.deduplicated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_served(&self) {
        self.cache_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self, elapsed_ms: u64) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.total_scan_ms.fetch_add(elapsed_ms, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sources(&self, statuses: &[SourceStatus]) {
        for status in statuses {
            let mut counters = self.adapters.entry(status.adapter.clone()).or_default();
            if status.available {
                counters.available += 1;
            } else {
                counters.unavailable += 1;
            }
        }
    }

    pub fn stats(&self) -> TelemetryStats {
        let completed = self.completed.load(Ordering::Relaxed);
        let total_ms = self.total_scan_ms.load(Ordering::Relaxed);

        TelemetryStats {
            jobs_submitted: self.submitted.load(Ordering::Relaxed),
            jobs_deduplicated: self.deduplicated.load(Ordering::Relaxed),
            jobs_served_from_cache: self.cache_served.load(Ordering::Relaxed),
            jobs_completed: completed,
            jobs_failed: self.failed.load(Ordering::Relaxed),
            avg_scan_ms: if completed > 0 {
                total_ms as f64 / completed as f64
            } else {
                0.0
            },
            adapters: self
                .adapters
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::SourceTier;

    fn status(adapter: &str, available: bool) -> SourceStatus {
        SourceStatus {
            adapter: adapter.to_string(),
            tier: SourceTier::Api,
            available,
            reason: None,
            latency_ms: 1,
        }
    }

    #[test]
    fn test_counters() {
        let telemetry = ScanTelemetry::new();
        telemetry.record_submitted();
        telemetry.record_submitted();
        telemetry.record_completed(100);
        telemetry.record_completed(300);
        telemetry.record_failed();
        telemetry.record_sources(&[status("rdap", true), status("wayback", false)]);
        telemetry.record_sources(&[status("rdap", true)]);

        let stats = telemetry.stats();
        assert_eq!(stats.jobs_submitted, 2);
        assert_eq!(stats.jobs_completed, 2);
        assert_eq!(stats.jobs_failed, 1);
        assert!((stats.avg_scan_ms - 200.0).abs() < f64::EPSILON);
        assert_eq!(stats.adapters["rdap"].available, 2);
        assert_eq!(stats.adapters["wayback"].unavailable, 1);
    }
}
