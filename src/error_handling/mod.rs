//! Error handling and run statistics.
//!
//! This module provides:
//! - Typed errors for configuration and startup failures
//! - Thread-safe run counters shared by every agent
//!
//! Transient network failures never surface as errors here: agents log them,
//! bump the matching counter, and abandon that single operation.

mod stats;
mod types;

// Re-export public API
pub use stats::{RunStats, StatKind, StatsSnapshot};
pub use types::{ConfigError, InitializationError, TlsProbeError};
