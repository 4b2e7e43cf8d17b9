//! Configuration constants.
//!
//! Default values for the CLI surface plus fixed operational limits used by
//! the agents.

/// Default port scan timeout in milliseconds
pub const DEFAULT_SCAN_TIMEOUT_MS: u64 = 3_000;
/// Default HTTP request timeout in milliseconds
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 15_000;
/// Default screenshot timeout in milliseconds
pub const DEFAULT_SCREENSHOT_TIMEOUT_MS: u64 = 30_000;
/// Default screenshot window resolution (width, height)
pub const DEFAULT_RESOLUTION: (u32, u32) = (1440, 900);
/// Default similarity threshold for screenshot clustering
pub const DEFAULT_SIMILARITY: f64 = 0.80;
/// Port list alias used when `--ports` is not given
pub const DEFAULT_PORTS: &str = "medium";

/// Upper bound on `--threads`
pub const MAX_THREADS: usize = 1024;

/// DNS query timeout in seconds (takeover detection)
pub const DNS_TIMEOUT_SECS: u64 = 5;

/// Maximum number of redirect hops when redirects are followed
pub const MAX_REDIRECT_HOPS: usize = 10;

/// Maximum response body size in bytes (5MB)
/// Bodies larger than this are truncated before being persisted
pub const MAX_RESPONSE_BODY_SIZE: usize = 5 * 1024 * 1024;

/// Output subdirectory for response headers
pub const HEADERS_DIR: &str = "headers";
/// Output subdirectory for response bodies
pub const HTML_DIR: &str = "html";
/// Output subdirectory for screenshots
pub const SCREENSHOTS_DIR: &str = "screenshots";
/// Session file written at the end of a run
pub const SESSION_FILE: &str = "page_recon_session.json";

/// Prefix of the temporary browser profile directory
pub const BROWSER_PROFILE_PREFIX: &str = "page_recon-chrome";

/// Query parameter appended to screenshot navigations to probe for
/// client-side prototype pollution
pub const PROTOTYPE_POLLUTION_PROBE: &str = "__proto__[foo]=polluted";

/// User-Agent presented by the headless browser
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
