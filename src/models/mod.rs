//! Models Module - Data Structures & Configuration
//!
//! Single source of truth for all data types and configuration.

pub mod config;
pub mod errors;
pub mod inputs;
pub mod types;

pub use config::*;
pub use errors::*;
pub use inputs::*;
pub use types::*;
