//! API Request/Response Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::errors::AppError;
use crate::models::types::{Report, ResolvedEntity};
use crate::utils::cache::CacheStats;
use crate::utils::telemetry::TelemetryStats;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn unauthorized() -> Self {
        Self {
            code: "API_UNAUTHORIZED".to_string(),
            message: "Invalid or missing API key".to_string(),
            details: None,
        }
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            code: "API_RATE_LIMITED".to_string(),
            message: format!("Rate limit exceeded. Retry after {} seconds", retry_after),
            details: Some(format!("retry_after: {}", retry_after)),
        }
    }
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            details: None,
        }
    }
}

// ============================================
// Scan
// ============================================

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub query: String,
    /// Skip the cache lookup; the new result is still cached
    #[serde(default)]
    pub force_fresh: bool,
}

#[derive(Debug, Serialize)]
pub struct ScanSubmittedData {
    pub job_id: String,
    pub canonical_id: String,
    pub cached: bool,
    pub deduplicated: bool,
}

// ============================================
// Report lookup
// ============================================

#[derive(Debug, Serialize)]
pub struct ReportData {
    pub canonical_id: String,
    pub report: Report,
    pub cached_at: DateTime<Utc>,
    pub age_secs: i64,
    /// Still inside its kind's TTL; stale entries are returned but flagged
    pub fresh: bool,
}

// ============================================
// Resolve preview
// ============================================

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveData {
    pub canonical_id: String,
    #[serde(flatten)]
    pub entity: ResolvedEntity,
}

// ============================================
// Stats / Health
// ============================================

#[derive(Debug, Serialize)]
pub struct StatsData {
    pub scans: TelemetryStats,
    pub cache: CacheStats,
    pub active_jobs: usize,
    pub inflight_scans: usize,
    pub adapters: Vec<&'static str>,
    pub uptime_seconds: u64,
    pub api_version: String,
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
}
