//! Recon run orchestration.
//!
//! A run goes through three phases:
//! 1. [`init`]: output directories, shared clients, agent registration
//! 2. drain: publish the targets and wait on the completion barrier, then
//!    publish `RunEnd` and wait again so teardown handlers finish
//! 3. [`finalize`]: write the session file and build the [`RunReport`]

mod finalize;
mod init;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use log::info;
use tokio::time::Instant;

use crate::app::Target;
use crate::browser::Capturer;
use crate::config::Config;
use crate::dns::HostResolver;
use crate::engine::{Event, PageSnapshot};
use crate::error_handling::StatsSnapshot;
use crate::fingerprint::FingerprintDb;

/// Results of a recon run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Final counter values
    pub stats: StatsSnapshot,
    /// Every page recorded, ordered by URL
    pub pages: Vec<PageSnapshot>,
    /// Path of the session JSON file
    pub session_path: PathBuf,
    /// Elapsed time in seconds
    pub elapsed_seconds: f64,
}

/// Builder for one recon run.
///
/// Collaborators that talk to the outside world (browser, DNS, fingerprint
/// database) default to the production implementations and can be replaced.
pub struct Recon {
    config: Arc<Config>,
    capturer: Option<Arc<dyn Capturer>>,
    resolver: Option<Arc<dyn HostResolver>>,
    fingerprints: Option<Arc<FingerprintDb>>,
}

impl Recon {
    pub fn new(config: Config) -> Self {
        Recon {
            config: Arc::new(config),
            capturer: None,
            resolver: None,
            fingerprints: None,
        }
    }

    /// Uses `capturer` instead of headless Chrome.
    pub fn with_capturer(mut self, capturer: Arc<dyn Capturer>) -> Self {
        self.capturer = Some(capturer);
        self
    }

    /// Uses `resolver` instead of the system DNS configuration.
    pub fn with_resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Uses `db` instead of loading `--fingerprints` or the bundled database.
    pub fn with_fingerprints(mut self, db: FingerprintDb) -> Self {
        self.fingerprints = Some(Arc::new(db));
        self
    }

    /// Runs the pipeline over `targets` until no work is left.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid, a required resource cannot be
    /// created, or the session file cannot be written. Per-target failures are
    /// logged and counted, never returned.
    pub async fn run(self, targets: Vec<Target>) -> Result<RunReport> {
        self.config.validate()?;
        let start_time = Instant::now();
        let session = init::init_run(self).await?;

        info!("Starting recon of {} target(s)", targets.len());
        for target in targets {
            match target {
                Target::Host(host) => session.bus().publish(Event::Host(host)),
                Target::Url(url) => session.bus().publish(Event::Url(url)),
            };
        }

        session.tasks().join_all().await;
        session.bus().publish(Event::RunEnd);
        session.tasks().join_all().await;
        session.bus().close();

        finalize::finalize_run(&session, start_time.elapsed().as_secs_f64()).await
    }
}
