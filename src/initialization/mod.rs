//! Application initialization and resource setup.
//!
//! This module provides functions to initialize shared resources:
//! - Logger
//! - HTTP client (redirect policy, proxy, timeouts)
//! - DNS resolver
//! - Output directory layout
//! - TLS crypto provider

mod client;
mod logger;
mod resolver;

use std::path::Path;

use rustls::crypto::{ring::default_provider, CryptoProvider};

use crate::config::{HEADERS_DIR, HTML_DIR, SCREENSHOTS_DIR};
use crate::error_handling::InitializationError;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;
pub use resolver::init_resolver;

/// Initializes the crypto provider for TLS operations.
///
/// Configures the global crypto provider for `rustls`. Components that build
/// their own `ClientConfig` pass the provider explicitly, so this only matters
/// for libraries that rely on the process default.
pub fn init_crypto_provider() {
    // The return value is ignored because reinstalling the provider is harmless
    let _ = CryptoProvider::install_default(default_provider());
}

/// Creates the output directory and its `headers/`, `html/` and `screenshots/`
/// subdirectories.
pub fn init_output_dirs(out_dir: &Path) -> Result<(), InitializationError> {
    for sub in [HEADERS_DIR, HTML_DIR, SCREENSHOTS_DIR] {
        let dir = out_dir.join(sub);
        std::fs::create_dir_all(&dir).map_err(|source| InitializationError::ResourceError {
            what: format!("output directory {}", dir.display()),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_output_dirs_creates_layout() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let out = temp.path().join("nested/out");
        init_output_dirs(&out).expect("output dirs");
        assert!(out.join("headers").is_dir());
        assert!(out.join("html").is_dir());
        assert!(out.join("screenshots").is_dir());
        // Idempotent
        init_output_dirs(&out).expect("output dirs again");
    }

    #[test]
    fn test_init_output_dirs_reports_failure() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let file = temp.path().join("not_a_dir");
        std::fs::write(&file, b"x").unwrap();
        let err = init_output_dirs(&file).unwrap_err();
        assert!(matches!(err, InitializationError::ResourceError { .. }));
    }
}
