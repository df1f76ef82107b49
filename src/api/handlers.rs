//! API Request Handlers

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::middleware::RATE_LIMITER;
use super::types::*;
use crate::core::resolver;
use crate::core::scanner::ScanManager;
use crate::models::errors::AppError;
use crate::models::types::ScanJob;
use crate::utils::constants::{APP_NAME, APP_VERSION, MAINTENANCE_INTERVAL_SECS};

type HandlerResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

/// Shared application state
pub struct AppState {
    pub manager: Arc<ScanManager>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(manager: Arc<ScanManager>) -> Self {
        Self {
            manager,
            start_time: Instant::now(),
        }
    }

    /// State plus the background sweep: expired cache entries and finished
    /// jobs older than `job_retention` are dropped every minute
    pub fn with_maintenance(manager: Arc<ScanManager>, job_retention: Duration) -> Self {
        let sweeper = Arc::clone(&manager);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(MAINTENANCE_INTERVAL_SECS));
            loop {
                interval.tick().await;
                let expired = sweeper.cache().cleanup_expired();
                let pruned = sweeper.prune_finished(job_retention);
                RATE_LIMITER.cleanup();
                if expired > 0 || pruned > 0 {
                    info!("🧹 Maintenance: {} cache entries, {} jobs removed", expired, pruned);
                }
            }
        });

        Self::new(manager)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Map an application error onto its HTTP status and error envelope
fn reject(err: AppError, start: Instant) -> (StatusCode, Json<ApiResponse<()>>) {
    let status =
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        warn!("⚠️ [{}] {}", err.code_str(), err.message);
    }
    (
        status,
        Json(ApiResponse::error(ApiError::from(&err), elapsed_ms(start))),
    )
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        service: APP_NAME.to_string(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

// ============================================
// Scan
// ============================================

/// `POST /v1/scan` → job id. Unclassifiable input is rejected before any
/// job exists.
pub async fn submit_scan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScanRequest>,
) -> HandlerResult<ScanSubmittedData> {
    let start = Instant::now();

    if req.query.trim().is_empty() {
        return Err(reject(AppError::bad_request("query cannot be empty"), start));
    }

    let entity = resolver::resolve(&req.query)
        .ok_or_else(|| reject(AppError::no_match(req.query.trim()), start))?;
    let canonical_id = entity.canonical_id();

    let outcome = state.manager.submit(entity, req.force_fresh);
    info!(
        "🎯 Scan {} for {} (cached: {}, joined: {})",
        outcome.job_id, canonical_id, outcome.cached, outcome.deduplicated
    );

    let data = ScanSubmittedData {
        job_id: outcome.job_id,
        canonical_id,
        cached: outcome.cached,
        deduplicated: outcome.deduplicated,
    };

    Ok(Json(ApiResponse::success(data, elapsed_ms(start))))
}

/// `GET /v1/scan/:job_id` → status, progress and, once complete, the report
pub async fn get_scan(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> HandlerResult<ScanJob> {
    let start = Instant::now();

    let job = state
        .manager
        .get_status(&job_id)
        .map_err(|e| reject(e, start))?;

    Ok(Json(ApiResponse::success(job, elapsed_ms(start))))
}

// ============================================
// Report lookup
// ============================================

/// `GET /v1/report/:canonical_id` → stored report, stale or not
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(canonical_id): Path<String>,
) -> HandlerResult<ReportData> {
    let start = Instant::now();
    let cache = state.manager.cache();

    let entry = cache.lookup(&canonical_id).ok_or_else(|| {
        reject(
            AppError::api_not_found(format!("No report cached for {}", canonical_id)),
            start,
        )
    })?;

    let data = ReportData {
        fresh: cache.is_fresh(&entry),
        age_secs: entry.age_secs(chrono::Utc::now()),
        cached_at: entry.cached_at,
        canonical_id: entry.canonical_id,
        report: entry.report,
    };

    Ok(Json(ApiResponse::success(data, elapsed_ms(start))))
}

// ============================================
// Resolve preview
// ============================================

/// `GET /v1/resolve?q=` → classification only, no job
pub async fn resolve_preview(Query(params): Query<ResolveQuery>) -> HandlerResult<ResolveData> {
    let start = Instant::now();

    let entity = resolver::resolve(&params.q)
        .ok_or_else(|| reject(AppError::no_match(params.q.trim()), start))?;

    let data = ResolveData {
        canonical_id: entity.canonical_id(),
        entity,
    };

    Ok(Json(ApiResponse::success(data, elapsed_ms(start))))
}

// ============================================
// Stats
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();
    let manager = &state.manager;
    let cache_stats = manager.cache().stats();

    info!(
        "📊 Cache Stats: {} entries, {:.1}% hit rate ({} hits / {} misses)",
        cache_stats.entries, cache_stats.hit_rate, cache_stats.hits, cache_stats.misses
    );

    let data = StatsData {
        scans: manager.telemetry().stats(),
        cache: cache_stats,
        active_jobs: manager.job_count(),
        inflight_scans: manager.inflight_count(),
        adapters: manager.registry().ids(),
        uptime_seconds: state.uptime_seconds(),
        api_version: APP_VERSION.to_string(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}
