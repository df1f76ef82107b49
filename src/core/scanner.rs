//! Scan Job Manager
//!
//! Wraps resolve → gather → score in an asynchronous job with an observable,
//! forward-only status. Completed reports go to the cache; a fresh cache hit
//! produces a job that is already complete without touching any adapter.
//! Concurrent submits for an entity that is already being scanned share
//! the in-flight job.
//!
//! Each job is a `watch` channel: the manager is the only writer, callers
//! read snapshots or await a terminal state.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::aggregator::Aggregator;
use crate::core::resolver;
use crate::core::scoring::ScoringEngine;
use crate::models::config::ScanConfig;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::inputs::ModuleInputs;
use crate::models::types::{Report, ResolvedEntity, ScanJob, ScanStatus};
use crate::providers::{self, AdapterRegistry};
use crate::utils::cache::ReportCache;
use crate::utils::telemetry::ScanTelemetry;

/// Progress checkpoints
const PROGRESS_FETCHING: u8 = 10;
const PROGRESS_GATHERED: u8 = 70;
const PROGRESS_SCORING: u8 = 80;
const PROGRESS_COMPLETE: u8 = 100;

/// What `submit` did with a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    pub job_id: String,
    /// Served from a fresh cache entry
    pub cached: bool,
    /// Joined a scan already in flight for the same entity
    pub deduplicated: bool,
}

/// `getResult` view of a job
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum JobResult {
    Ready { report: Report },
    Pending { status: ScanStatus, progress_percent: u8 },
    Failed { reason: String },
}

pub struct ScanManager {
    jobs: DashMap<String, watch::Sender<ScanJob>>,
    /// canonical id -> id of the job currently scanning it
    inflight: DashMap<String, String>,
    registry: AdapterRegistry,
    aggregator: Aggregator,
    engine: ScoringEngine,
    cache: ReportCache,
    telemetry: Arc<ScanTelemetry>,
}

impl ScanManager {
    pub fn new(
        registry: AdapterRegistry,
        aggregator: Aggregator,
        engine: ScoringEngine,
        cache: ReportCache,
        telemetry: Arc<ScanTelemetry>,
    ) -> Self {
        Self {
            jobs: DashMap::new(),
            inflight: DashMap::new(),
            registry,
            aggregator,
            engine,
            cache,
            telemetry,
        }
    }

    /// Production wiring: default adapter catalog, configured cache and tiers
    pub fn from_config(config: &ScanConfig) -> AppResult<Self> {
        let registry = providers::default_registry(config)?;
        info!("🧩 Adapters: {}", registry.ids().join(", "));

        Ok(Self::new(
            registry,
            Aggregator::new(config.adapter_timeout),
            ScoringEngine::new(config.scoring.clone()),
            ReportCache::from_config(config),
            Arc::new(ScanTelemetry::new()),
        ))
    }

    pub fn cache(&self) -> &ReportCache {
        &self.cache
    }

    pub fn telemetry(&self) -> &Arc<ScanTelemetry> {
        &self.telemetry
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }

    // ============================================
    // Submission
    // ============================================

    /// Resolve a raw query and submit it
    pub fn scan_query(self: &Arc<Self>, query: &str, force_fresh: bool) -> AppResult<SubmitOutcome> {
        let entity = resolver::resolve(query).ok_or_else(|| AppError::no_match(query.trim()))?;
        Ok(self.submit(entity, force_fresh))
    }

    /// Start (or join, or short-circuit) a scan for an entity.
    ///
    /// `force_fresh` skips the cache lookup; the new result is still written back.
    pub fn submit(self: &Arc<Self>, entity: ResolvedEntity, force_fresh: bool) -> SubmitOutcome {
        self.telemetry.record_submitted();

        if !force_fresh {
            if let Some(hit) = self.cache.get_fresh(&entity) {
                let job_id = Uuid::new_v4().to_string();
                let mut job = ScanJob::new(&job_id, entity);
                job.status = ScanStatus::Complete;
                job.progress_percent = PROGRESS_COMPLETE;
                job.result = Some(hit.report);
                job.cached = true;
                self.jobs.insert(job_id.clone(), watch::Sender::new(job));
                self.telemetry.record_cache_served();
                return SubmitOutcome { job_id, cached: true, deduplicated: false };
            }
        }

        let canonical_id = entity.canonical_id();
        let job_id = Uuid::new_v4().to_string();
        match self.inflight.entry(canonical_id.clone()) {
            Entry::Occupied(mut slot) => {
                if self.is_running(slot.get()) {
                    let running = slot.get().clone();
                    info!("🔗 Joining in-flight scan {} for {}", running, canonical_id);
                    self.telemetry.record_deduplicated();
                    return SubmitOutcome { job_id: running, cached: false, deduplicated: true };
                }
                self.register_job(&job_id, entity.clone());
                slot.insert(job_id.clone());
            }
            Entry::Vacant(slot) => {
                self.register_job(&job_id, entity.clone());
                slot.insert(job_id.clone());
            }
        }
        info!("📥 Job {} queued for {}", job_id, canonical_id);

        self.spawn_pipeline(job_id.clone(), entity);
        SubmitOutcome { job_id, cached: false, deduplicated: false }
    }

    fn register_job(&self, job_id: &str, entity: ResolvedEntity) {
        self.jobs
            .insert(job_id.to_string(), watch::Sender::new(ScanJob::new(job_id, entity)));
    }

    fn is_running(&self, job_id: &str) -> bool {
        self.jobs
            .get(job_id)
            .is_some_and(|tx| !tx.borrow().status.is_terminal())
    }

    fn spawn_pipeline(self: &Arc<Self>, job_id: String, entity: ResolvedEntity) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let canonical_id = entity.canonical_id();

            // Fetching starts here so a failure is never recorded from `queued`
            if let Err(e) = manager.advance(&job_id, ScanStatus::Fetching, PROGRESS_FETCHING) {
                error!("❌ Job {} could not start: {}", job_id, e);
                manager.inflight.remove_if(&canonical_id, |_, id| id == &job_id);
                return;
            }

            let worker = tokio::spawn({
                let manager = Arc::clone(&manager);
                let job_id = job_id.clone();
                async move { manager.run_pipeline(&job_id, entity).await }
            });

            let outcome = match worker.await {
                Ok(outcome) => outcome,
                Err(join_error) => Err(AppError::new(
                    ErrorCode::JobAborted,
                    format!("Scan task aborted: {}", join_error),
                )),
            };
            if let Err(e) = outcome {
                manager.fail(&job_id, &e);
            }

            manager.inflight.remove_if(&canonical_id, |_, id| id == &job_id);
        });
    }

    async fn run_pipeline(&self, job_id: &str, entity: ResolvedEntity) -> AppResult<()> {
        let started = Instant::now();

        let adapters = self.registry.applicable(entity.kind);
        let span = PROGRESS_GATHERED - PROGRESS_FETCHING;
        let evidence = self
            .aggregator
            .gather_with_progress(&entity, &adapters, |done, total| {
                let progress = PROGRESS_FETCHING as usize + span as usize * done / total.max(1);
                self.set_progress(job_id, progress as u8);
            })
            .await;
        self.telemetry.record_sources(&evidence.statuses);

        self.advance(job_id, ScanStatus::Scoring, PROGRESS_SCORING)?;
        let inputs = ModuleInputs::from_evidence(&evidence, Utc::now());
        let mut report = self.engine.score(&inputs)?;
        report.sources = evidence.statuses;

        // A failing cache downgrades future requests to rescans, nothing more
        if let Err(e) = self.cache.put(&entity, report.clone()) {
            warn!("⚠️ Report for {} not cached: {}", entity.canonical_id(), e);
        }

        let summary = report.summary();
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.telemetry.record_completed(elapsed_ms);
        self.finish(job_id, report)?;

        info!("🏁 Job {} complete in {}ms: {}", job_id, elapsed_ms, summary);
        Ok(())
    }

    // ============================================
    // State transitions (single writer per job)
    // ============================================

    fn update<F>(&self, job_id: &str, apply: F) -> AppResult<()>
    where
        F: FnOnce(&mut ScanJob) -> AppResult<bool>,
    {
        let sender = self
            .jobs
            .get(job_id)
            .ok_or_else(|| AppError::job_not_found(job_id))?;

        let mut outcome = Ok(());
        sender.send_if_modified(|job| match apply(job) {
            Ok(changed) => {
                if changed {
                    job.updated_at = Utc::now();
                }
                changed
            }
            Err(e) => {
                outcome = Err(e);
                false
            }
        });
        outcome
    }

    fn transition(job: &mut ScanJob, next: ScanStatus) -> AppResult<()> {
        if !job.status.can_transition_to(next) {
            return Err(AppError::invalid_transition(job.status.as_str(), next.as_str()));
        }
        info!("🔄 Job {}: {} → {}", job.id, job.status.as_str(), next.as_str());
        job.status = next;
        Ok(())
    }

    /// Move forward to `next`; progress never decreases
    pub(crate) fn advance(&self, job_id: &str, next: ScanStatus, progress: u8) -> AppResult<()> {
        self.update(job_id, |job| {
            Self::transition(job, next)?;
            job.progress_percent = job.progress_percent.max(progress);
            Ok(true)
        })
    }

    fn set_progress(&self, job_id: &str, progress: u8) {
        let _ = self.update(job_id, |job| {
            let changed = !job.status.is_terminal() && progress > job.progress_percent;
            if changed {
                job.progress_percent = progress;
            }
            Ok(changed)
        });
    }

    fn finish(&self, job_id: &str, report: Report) -> AppResult<()> {
        self.update(job_id, |job| {
            Self::transition(job, ScanStatus::Complete)?;
            job.progress_percent = PROGRESS_COMPLETE;
            job.result = Some(report);
            Ok(true)
        })
    }

    fn fail(&self, job_id: &str, err: &AppError) {
        self.telemetry.record_failed();
        let result = self.update(job_id, |job| {
            Self::transition(job, ScanStatus::Failed)?;
            job.error = Some(format!("[{}] {}", err.code_str(), err.message));
            Ok(true)
        });
        match result {
            Ok(()) => error!("❌ Job {} failed: {}", job_id, err),
            Err(e) => error!("❌ Job {} failed ({}) and could not be marked: {}", job_id, err, e),
        }
    }

    // ============================================
    // Queries
    // ============================================

    /// Snapshot of a job
    pub fn get_status(&self, job_id: &str) -> AppResult<ScanJob> {
        self.jobs
            .get(job_id)
            .map(|tx| tx.borrow().clone())
            .ok_or_else(|| AppError::job_not_found(job_id))
    }

    pub fn get_result(&self, job_id: &str) -> AppResult<JobResult> {
        let job = self.get_status(job_id)?;
        Ok(match job.status {
            ScanStatus::Complete => match job.result {
                Some(report) => JobResult::Ready { report },
                None => JobResult::Failed {
                    reason: "Job completed without a report".to_string(),
                },
            },
            ScanStatus::Failed => JobResult::Failed {
                reason: job.error.unwrap_or_else(|| "Unknown failure".to_string()),
            },
            status => JobResult::Pending {
                status,
                progress_percent: job.progress_percent,
            },
        })
    }

    /// Every status change of a job, starting with the current one
    pub fn subscribe(&self, job_id: &str) -> AppResult<watch::Receiver<ScanJob>> {
        self.jobs
            .get(job_id)
            .map(|tx| tx.subscribe())
            .ok_or_else(|| AppError::job_not_found(job_id))
    }

    /// Wait until a job reaches `complete` or `failed`
    pub async fn wait(&self, job_id: &str) -> AppResult<ScanJob> {
        let mut rx = self.subscribe(job_id)?;
        let job = rx
            .wait_for(|job| job.status.is_terminal())
            .await
            .map_err(|_| AppError::job_not_found(job_id))?;
        Ok(job.clone())
    }

    /// Drop finished jobs older than `retention`
    pub fn prune_finished(&self, retention: Duration) -> usize {
        let retention = chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::MAX);
        let now = Utc::now();
        let before = self.jobs.len();
        self.jobs.retain(|_, tx| {
            let job = tx.borrow();
            !(job.status.is_terminal() && now - job.updated_at > retention)
        });
        let removed = before.saturating_sub(self.jobs.len());
        if removed > 0 {
            info!("🧹 Pruned {} finished jobs", removed);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::CacheTtl;

    fn manager() -> Arc<ScanManager> {
        Arc::new(ScanManager::new(
            AdapterRegistry::new(),
            Aggregator::new(Duration::from_millis(100)),
            ScoringEngine::default(),
            ReportCache::in_memory(CacheTtl::uniform(Duration::from_secs(60))),
            Arc::new(ScanTelemetry::new()),
        ))
    }

    #[tokio::test]
    async fn test_ticker_scan_completes_with_empty_report() {
        let manager = manager();
        let outcome = manager.scan_query("$PEPE", false).unwrap();
        let job = manager.wait(&outcome.job_id).await.unwrap();

        assert_eq!(job.status, ScanStatus::Complete);
        assert_eq!(job.progress_percent, 100);
        let report = job.result.unwrap();
        assert_eq!(report.score, 0);
        assert!(matches!(
            manager.get_result(&outcome.job_id).unwrap(),
            JobResult::Ready { .. }
        ));
    }

    #[tokio::test]
    async fn test_second_submit_is_served_from_cache() {
        let manager = manager();
        let first = manager.scan_query("$PEPE", false).unwrap();
        manager.wait(&first.job_id).await.unwrap();

        let second = manager.scan_query("PEPE", false).unwrap();
        assert!(second.cached);
        let job = manager.get_status(&second.job_id).unwrap();
        assert_eq!(job.status, ScanStatus::Complete);
        assert!(job.cached);

        let forced = manager.scan_query("$PEPE", true).unwrap();
        assert!(!forced.cached);
    }

    #[tokio::test]
    async fn test_unclassifiable_query_is_rejected() {
        let err = manager().scan_query("   ", false).unwrap_err();
        assert_eq!(err.code, ErrorCode::ResolveNoMatch);
    }

    #[tokio::test]
    async fn test_status_never_moves_backwards() {
        let manager = manager();
        let outcome = manager.scan_query("$LARP", false).unwrap();
        manager.wait(&outcome.job_id).await.unwrap();

        let err = manager
            .advance(&outcome.job_id, ScanStatus::Fetching, 10)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::JobInvalidTransition);
        assert_eq!(manager.get_status(&outcome.job_id).unwrap().status, ScanStatus::Complete);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let manager = manager();
        assert_eq!(manager.get_status("nope").unwrap_err().code, ErrorCode::JobNotFound);
        assert!(manager.wait("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_prune_keeps_recent_jobs() {
        let manager = manager();
        let outcome = manager.scan_query("$LARP", false).unwrap();
        manager.wait(&outcome.job_id).await.unwrap();

        assert_eq!(manager.prune_finished(Duration::from_secs(3600)), 0);
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(manager.prune_finished(Duration::ZERO), 1);
        assert_eq!(manager.job_count(), 0);
    }
}
