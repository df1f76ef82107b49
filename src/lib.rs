//! LarpScore Library
//!
//! Trust intelligence pipeline for crypto projects:
//! - Entity resolution of free-form queries (tickers, contracts, handles, domains)
//! - Concurrent OSINT fan-out across independent intelligence adapters
//! - Weighted four-module LARP risk scoring with confidence
//! - Asynchronous scan jobs with a per-kind TTL report cache

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::aggregator::{Aggregator, EvidenceSet};
pub use crate::core::resolver::resolve;
pub use crate::core::scanner::{JobResult, ScanManager, SubmitOutcome};
pub use crate::core::scoring::ScoringEngine;
pub use models::config::{CacheTtl, ScanConfig, ScoringConfig, ServerConfig};
pub use models::errors::{AppError, AppResult, ErrorCode};
pub use models::inputs::ModuleInputs;
pub use models::types::{
    Confidence, EntityKind, Report, ResolvedEntity, RiskLevel, RiskModule, ScanJob, ScanStatus,
};
pub use providers::{AdapterOutcome, AdapterRegistry, IntelAdapter, Payload, Unavailable};
pub use utils::cache::{CacheStats, ReportCache, ReportStore};
pub use utils::telemetry::{ScanTelemetry, TelemetryStats};
