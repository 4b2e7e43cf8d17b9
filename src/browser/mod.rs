//! Screenshot capture.
//!
//! The screenshotter talks to a browser only through [`Capturer`], so the
//! pipeline can run against any engine (or none, in tests).

mod chrome;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::PROTOTYPE_POLLUTION_PROBE;

pub use chrome::ChromeCapturer;

/// One capture job.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    /// URL to navigate to, probe parameter included
    pub url: String,
    /// Browser profile directory for this capture
    pub profile_dir: PathBuf,
    /// Settle time between navigation and capture
    pub delay: Duration,
    /// Capture the whole document instead of the viewport
    pub full_page: bool,
    /// Per-step browser timeout; the caller enforces the overall deadline
    pub timeout: Duration,
}

/// Result of a successful capture.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    /// PNG bytes
    pub png: Vec<u8>,
    /// `window.foo` was set by the prototype pollution probe
    pub prototype_polluted: bool,
}

/// Something that can load a URL and screenshot it.
#[async_trait]
pub trait Capturer: Send + Sync {
    /// Navigates to `request.url` and returns a PNG.
    ///
    /// A JavaScript dialog opening during the capture is an error.
    async fn capture(&self, request: CaptureRequest) -> Result<Capture>;
}

/// Appends the prototype pollution probe to `url`.
pub fn probe_url(url: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{PROTOTYPE_POLLUTION_PROBE}")
}
