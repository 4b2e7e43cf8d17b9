//! Configuration types and CLI options.
//!
//! `Opt` is the raw command-line surface parsed by `clap`. It is resolved once
//! into an immutable [`Config`] which every component receives by shared
//! reference; nothing mutates it after the pipeline starts.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_PORTS, DEFAULT_RESOLUTION, DEFAULT_SCAN_TIMEOUT_MS,
    DEFAULT_SCREENSHOT_TIMEOUT_MS, DEFAULT_SIMILARITY, MAX_THREADS,
};
use crate::config::ports::{parse_ports, MEDIUM_PORT_LIST};
use crate::error_handling::ConfigError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Hosts on stdin, default port list
/// cat hosts.txt | page_recon
///
/// # Large port list, only keep 200/301 pages, save bodies for fingerprinting
/// page_recon --input-file hosts.txt --ports large --match-codes 200,301 --save-body
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "page_recon",
    version,
    about = "Discovers web ports, fetches pages, captures screenshots and runs passive security checks."
)]
pub struct Opt {
    /// File to read hosts/URLs from (default: stdin)
    #[arg(long, value_parser)]
    pub input_file: Option<PathBuf>,

    /// Number of concurrent workers (0 = number of logical CPUs)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Ports to scan on hosts. Supported list aliases: small, medium, large, xlarge
    #[arg(long, default_value = DEFAULT_PORTS)]
    pub ports: String,

    /// Generic timeout in milliseconds for every stage (overrides specific timeouts when set)
    #[arg(long, default_value_t = 0)]
    pub timeout: u64,

    /// Timeout in milliseconds for port scans
    #[arg(long, default_value_t = DEFAULT_SCAN_TIMEOUT_MS)]
    pub scan_timeout: u64,

    /// Timeout in milliseconds for HTTP requests
    #[arg(long, default_value_t = DEFAULT_HTTP_TIMEOUT_MS)]
    pub http_timeout: u64,

    /// Timeout in milliseconds for screenshots
    #[arg(long, default_value_t = DEFAULT_SCREENSHOT_TIMEOUT_MS)]
    pub screenshot_timeout: u64,

    /// Delay in milliseconds before taking screenshots
    #[arg(long, default_value_t = 0)]
    pub screenshot_delay: u64,

    /// Directory to write files to
    #[arg(long, value_parser, default_value = ".")]
    pub out: PathBuf,

    /// Proxy to use for HTTP requests and the browser
    #[arg(long)]
    pub proxy: Option<String>,

    /// Full path to the Chrome/Chromium executable (default: auto-detect)
    #[arg(long, value_parser)]
    pub chrome_path: Option<PathBuf>,

    /// Screenshot resolution (format: width,height)
    #[arg(long, default_value = "1440,900")]
    pub resolution: String,

    /// Only accept pages with these status codes (comma-separated)
    #[arg(long)]
    pub match_codes: Option<String>,

    /// Reject pages with these status codes (comma-separated)
    #[arg(long)]
    pub filter_codes: Option<String>,

    /// Save response bodies to files (required for fingerprinting and takeover detection)
    #[arg(long)]
    pub save_body: bool,

    /// Capture the full page instead of the viewport
    #[arg(long)]
    pub full_page: bool,

    /// Extra header for browser requests (format: "Name: Value", repeatable)
    #[arg(long = "http-header")]
    pub http_headers: Vec<String>,

    /// Cluster similarity threshold for screenshots
    #[arg(long, default_value_t = DEFAULT_SIMILARITY)]
    pub similarity: f64,

    /// Do not follow HTTP redirects
    #[arg(long)]
    pub no_redirect: bool,

    /// Technologies JSON file or directory (Wappalyzer format) replacing the bundled database
    #[arg(long, value_parser)]
    pub fingerprints: Option<PathBuf>,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Suppress all output except errors
    #[arg(long, conflicts_with = "debug")]
    pub silent: bool,

    /// Print debugging information
    #[arg(long)]
    pub debug: bool,
}

/// Resolved run configuration.
///
/// Built once before the pipeline starts and shared read-only afterwards.
/// It can be constructed programmatically without any CLI dependencies.
///
/// # Examples
///
/// ```no_run
/// use page_recon::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     out_dir: PathBuf::from("./recon"),
///     save_body: true,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Input file (None reads stdin)
    pub input_file: Option<PathBuf>,
    /// Worker pool size
    pub threads: usize,
    /// Ports probed per host
    pub ports: Vec<u16>,
    /// Port scan deadline
    pub scan_timeout: Duration,
    /// HTTP request deadline
    pub http_timeout: Duration,
    /// Screenshot deadline
    pub screenshot_timeout: Duration,
    /// Settle time before capture
    pub screenshot_delay: Duration,
    /// Output directory
    pub out_dir: PathBuf,
    /// Outbound proxy for HTTP and the browser
    pub proxy: Option<String>,
    /// Chrome/Chromium executable
    pub chrome_path: Option<PathBuf>,
    /// Browser window size
    pub resolution: (u32, u32),
    /// Status code allow-list (empty = disabled)
    pub match_codes: Vec<u16>,
    /// Status code deny-list (empty = disabled)
    pub filter_codes: Vec<u16>,
    /// Persist response bodies
    pub save_body: bool,
    /// Full-page screenshots
    pub full_page: bool,
    /// Extra headers injected into browser-driven requests
    pub http_headers: Vec<(String, String)>,
    /// Screenshot clustering threshold (consumed outside the pipeline)
    pub similarity: f64,
    /// Follow HTTP redirects
    pub follow_redirects: bool,
    /// Technologies database override
    pub fingerprints: Option<PathBuf>,
    /// Log level
    pub log_level: LogLevel,
    /// Log format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_file: None,
            threads: num_cpus::get(),
            ports: MEDIUM_PORT_LIST.to_vec(),
            scan_timeout: Duration::from_millis(DEFAULT_SCAN_TIMEOUT_MS),
            http_timeout: Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS),
            screenshot_timeout: Duration::from_millis(DEFAULT_SCREENSHOT_TIMEOUT_MS),
            screenshot_delay: Duration::ZERO,
            out_dir: PathBuf::from("."),
            proxy: None,
            chrome_path: None,
            resolution: DEFAULT_RESOLUTION,
            match_codes: Vec::new(),
            filter_codes: Vec::new(),
            save_body: false,
            full_page: false,
            http_headers: Vec::new(),
            similarity: DEFAULT_SIMILARITY,
            follow_redirects: true,
            fingerprints: None,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl Config {
    /// Checks value ranges that the type system does not enforce.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 || self.threads > MAX_THREADS {
            return Err(ConfigError::OutOfRange {
                option: "threads",
                value: self.threads.to_string(),
            });
        }
        if self.ports.is_empty() {
            return Err(ConfigError::InvalidPort(String::new()));
        }
        for (option, timeout) in [
            ("scan-timeout", self.scan_timeout),
            ("http-timeout", self.http_timeout),
            ("screenshot-timeout", self.screenshot_timeout),
        ] {
            if timeout.is_zero() {
                return Err(ConfigError::OutOfRange {
                    option,
                    value: "0".to_string(),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.similarity) {
            return Err(ConfigError::OutOfRange {
                option: "similarity",
                value: self.similarity.to_string(),
            });
        }
        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            return Err(ConfigError::InvalidResolution(format!(
                "{},{}",
                self.resolution.0, self.resolution.1
            )));
        }
        Ok(())
    }

    /// Returns true when `code` passes the allow-list and deny-list.
    ///
    /// The allow-list is checked first; either list rejects on its own.
    pub fn accepts_status(&self, code: u16) -> bool {
        if !self.match_codes.is_empty() && !self.match_codes.contains(&code) {
            return false;
        }
        !self.filter_codes.contains(&code)
    }
}

impl TryFrom<Opt> for Config {
    type Error = ConfigError;

    fn try_from(opt: Opt) -> Result<Self, Self::Error> {
        let (scan_ms, http_ms, screenshot_ms) = if opt.timeout != 0 {
            (opt.timeout, opt.timeout, opt.timeout)
        } else {
            (opt.scan_timeout, opt.http_timeout, opt.screenshot_timeout)
        };

        let log_level = if opt.silent {
            LogLevel::Error
        } else if opt.debug {
            LogLevel::Debug
        } else {
            opt.log_level
        };

        let http_headers = opt
            .http_headers
            .iter()
            .map(|raw| parse_header(raw))
            .collect::<Result<Vec<_>, _>>()?;

        let config = Config {
            input_file: opt.input_file,
            threads: if opt.threads == 0 {
                num_cpus::get()
            } else {
                opt.threads
            },
            ports: parse_ports(&opt.ports)?,
            scan_timeout: Duration::from_millis(scan_ms),
            http_timeout: Duration::from_millis(http_ms),
            screenshot_timeout: Duration::from_millis(screenshot_ms),
            screenshot_delay: Duration::from_millis(opt.screenshot_delay),
            out_dir: opt.out,
            proxy: opt.proxy.filter(|p| !p.trim().is_empty()),
            chrome_path: opt.chrome_path,
            resolution: parse_resolution(&opt.resolution)?,
            match_codes: parse_status_codes(opt.match_codes.as_deref().unwrap_or(""))?,
            filter_codes: parse_status_codes(opt.filter_codes.as_deref().unwrap_or(""))?,
            save_body: opt.save_body,
            full_page: opt.full_page,
            http_headers,
            similarity: opt.similarity,
            follow_redirects: !opt.no_redirect,
            fingerprints: opt.fingerprints,
            log_level,
            log_format: opt.log_format,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Parses a comma-separated status code list. Empty input yields an empty list.
pub fn parse_status_codes(raw: &str) -> Result<Vec<u16>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u16>()
                .ok()
                .filter(|code| (100..=599).contains(code))
                .ok_or_else(|| ConfigError::InvalidStatusCode(part.to_string()))
        })
        .collect()
}

fn parse_resolution(raw: &str) -> Result<(u32, u32), ConfigError> {
    let invalid = || ConfigError::InvalidResolution(raw.to_string());
    let (width, height) = raw.split_once(',').ok_or_else(invalid)?;
    let width = width.trim().parse().map_err(|_| invalid())?;
    let height = height.trim().parse().map_err(|_| invalid())?;
    Ok((width, height))
}

fn parse_header(raw: &str) -> Result<(String, String), ConfigError> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(ConfigError::InvalidHeader(raw.to_string())),
    }
}
