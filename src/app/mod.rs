//! Input parsing and reporting used by the binary.

pub mod statistics;
pub mod url;

pub use statistics::print_run_summary;
pub use url::{parse_targets, validate_and_normalize_url, Target};
