//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, limits, output layout)
//! - Port list aliases
//! - CLI option types and the resolved run configuration

mod constants;
mod ports;
mod types;

// Re-export all constants
pub use constants::*;
pub use ports::{parse_ports, LARGE_PORT_LIST, MEDIUM_PORT_LIST, SMALL_PORT_LIST, XLARGE_PORT_LIST};
pub use types::{parse_status_codes, Config, LogFormat, LogLevel, Opt};
