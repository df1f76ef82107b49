//! Core Module - Scan Pipeline
//!
//! Entity resolution, evidence aggregation, signal extraction, scoring
//! and the job manager that strings them together.

pub mod aggregator;
pub mod resolver;
pub mod scanner;
pub mod scoring;
pub mod signals;

pub use aggregator::{Aggregator, EvidenceSet, SourcedPayload};
pub use resolver::resolve;
pub use scanner::{JobResult, ScanManager, SubmitOutcome};
pub use scoring::{composite, top_tags, ScoringEngine};
