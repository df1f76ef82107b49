//! Utils Module - Shared Infrastructure
//!
//! Report cache, scan telemetry and the constants every other module reads.

pub mod cache;
pub mod constants;
pub mod telemetry;

pub use cache::*;
pub use constants::*;
pub use telemetry::*;
