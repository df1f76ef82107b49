//! Aggregator - concurrent fan-out over applicable adapters
//!
//! Every adapter runs concurrently under its own timeout. Results are
//! collected as they complete, then laid out in priority order so the
//! evidence set is deterministic regardless of network timing.

use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::models::types::{ResolvedEntity, SourceStatus, SourceTier};
use crate::providers::adapter::{AdapterOutcome, IntelAdapter, Payload, Unavailable};

/// One available payload, tagged with its originating adapter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourcedPayload {
    pub adapter: &'static str,
    pub tier: SourceTier,
    pub payload: Payload,
}

/// Merged output of one aggregation pass, in adapter priority order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvidenceSet {
    pub entries: Vec<SourcedPayload>,
    /// One line per applicable adapter, available or not
    pub statuses: Vec<SourceStatus>,
}

impl EvidenceSet {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn available_count(&self) -> usize {
        self.statuses.iter().filter(|s| s.available).count()
    }
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    adapter_timeout: Duration,
}

impl Aggregator {
    pub fn new(adapter_timeout: Duration) -> Self {
        Self { adapter_timeout }
    }

    pub async fn gather(
        &self,
        entity: &ResolvedEntity,
        adapters: &[Arc<dyn IntelAdapter>],
    ) -> EvidenceSet {
        self.gather_with_progress(entity, adapters, |_, _| {}).await
    }

    /// Same as [`gather`](Self::gather), reporting `(completed, total)` as
    /// each adapter finishes
    pub async fn gather_with_progress<F>(
        &self,
        entity: &ResolvedEntity,
        adapters: &[Arc<dyn IntelAdapter>],
        mut on_progress: F,
    ) -> EvidenceSet
    where
        F: FnMut(usize, usize),
    {
        let total = adapters.len();
        if total == 0 {
            debug!("No adapters apply to {}", entity.canonical_id());
            return EvidenceSet::default();
        }

        let timeout = self.adapter_timeout;
        let mut pending: FuturesUnordered<_> = adapters
            .iter()
            .enumerate()
            .map(|(index, adapter)| async move {
                let started = Instant::now();
                let outcome = match tokio::time::timeout(timeout, adapter.fetch(entity)).await {
                    Ok(outcome) => outcome,
                    Err(_) => AdapterOutcome::Unavailable(Unavailable::TimedOut),
                };
                (index, outcome, started.elapsed())
            })
            .collect();

        let mut slots: Vec<Option<(AdapterOutcome, Duration)>> = vec![None; total];
        let mut completed = 0;
        while let Some((index, outcome, elapsed)) = pending.next().await {
            slots[index] = Some((outcome, elapsed));
            completed += 1;
            on_progress(completed, total);
        }

        let mut set = EvidenceSet::default();
        for (adapter, slot) in adapters.iter().zip(slots) {
            let Some((outcome, elapsed)) = slot else {
                continue;
            };
            let latency_ms = elapsed.as_millis() as u64;

            match outcome {
                AdapterOutcome::Available(payload) => {
                    debug!("✅ {} answered in {}ms", adapter.id(), latency_ms);
                    set.statuses.push(SourceStatus {
                        adapter: adapter.id().to_string(),
                        tier: adapter.tier(),
                        available: true,
                        reason: None,
                        latency_ms,
                    });
                    set.entries.push(SourcedPayload {
                        adapter: adapter.id(),
                        tier: adapter.tier(),
                        payload,
                    });
                }
                AdapterOutcome::Unavailable(reason) => {
                    if reason == Unavailable::NotApplicable {
                        debug!("{} not applicable to {}", adapter.id(), entity.canonical_id());
                    } else {
                        warn!(
                            "⚠️ {} unavailable for {}: {} ({}ms)",
                            adapter.id(),
                            entity.canonical_id(),
                            reason,
                            latency_ms
                        );
                    }
                    set.statuses.push(SourceStatus {
                        adapter: adapter.id().to_string(),
                        tier: adapter.tier(),
                        available: false,
                        reason: Some(reason.to_string()),
                        latency_ms,
                    });
                }
            }
        }

        info!(
            "📡 Gathered {}/{} sources for {}",
            set.entries.len(),
            total,
            entity.canonical_id()
        );
        set
    }
}
