//! page_recon library: event-driven web reconnaissance
//!
//! Hosts go in; for every open web port the pipeline fetches the page, takes a
//! screenshot and runs passive checks (TLS version, technology fingerprints,
//! subdomain takeover). Agents never call each other: they communicate over an
//! [`EventBus`] and record results on shared [`Page`]s in a [`Session`]. The
//! run ends when the completion barrier drains.
//!
//! # Example
//!
//! ```no_run
//! use page_recon::{parse_targets, Config, Recon};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config {
//!     out_dir: std::path::PathBuf::from("recon"),
//!     save_body: true,
//!     ..Default::default()
//! };
//!
//! let targets = parse_targets("example.com\nhttps://app.example.com/\n");
//! let report = Recon::new(config).run(targets).await?;
//! println!("{} pages, session in {}", report.pages.len(), report.session_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Screenshots need a local Chrome or
//! Chromium unless a custom [`Capturer`] is supplied.

pub mod agents;
mod app;
pub mod browser;
pub mod config;
pub mod dns;
pub mod engine;
mod error_handling;
pub mod fetch;
pub mod fingerprint;
pub mod initialization;
mod run;
pub mod takeover;
pub mod tls;

// Re-export public API
pub use app::{parse_targets, print_run_summary, validate_and_normalize_url, Target};
pub use browser::{Capture, CaptureRequest, Capturer};
pub use config::{Config, LogFormat, LogLevel, Opt};
pub use dns::{HostResolver, Resolution};
pub use engine::{Agent, Event, EventBus, Page, PageSnapshot, Session, Severity, Tag, TaskGroup, Topic};
pub use error_handling::{ConfigError, InitializationError, RunStats, StatKind, StatsSnapshot, TlsProbeError};
pub use run::{Recon, RunReport};
pub use takeover::{evaluate_rules, Rule, TakeoverVerdict, RULES};
