//! Run finalization: session file and report.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use super::RunReport;
use crate::config::{Config, SESSION_FILE};
use crate::engine::{PageSnapshot, Session};
use crate::error_handling::StatsSnapshot;

/// Configuration values recorded in the session file.
#[derive(Debug, Serialize)]
struct ConfigSummary<'a> {
    threads: usize,
    ports: &'a [u16],
    scan_timeout_ms: u128,
    http_timeout_ms: u128,
    screenshot_timeout_ms: u128,
    screenshot_delay_ms: u128,
    out_dir: &'a std::path::Path,
    proxy: Option<&'a str>,
    resolution: (u32, u32),
    match_codes: &'a [u16],
    filter_codes: &'a [u16],
    save_body: bool,
    full_page: bool,
    similarity: f64,
    follow_redirects: bool,
}

impl<'a> From<&'a Config> for ConfigSummary<'a> {
    fn from(config: &'a Config) -> Self {
        ConfigSummary {
            threads: config.threads,
            ports: &config.ports,
            scan_timeout_ms: config.scan_timeout.as_millis(),
            http_timeout_ms: config.http_timeout.as_millis(),
            screenshot_timeout_ms: config.screenshot_timeout.as_millis(),
            screenshot_delay_ms: config.screenshot_delay.as_millis(),
            out_dir: &config.out_dir,
            proxy: config.proxy.as_deref(),
            resolution: config.resolution,
            match_codes: &config.match_codes,
            filter_codes: &config.filter_codes,
            save_body: config.save_body,
            full_page: config.full_page,
            similarity: config.similarity,
            follow_redirects: config.follow_redirects,
        }
    }
}

#[derive(Debug, Serialize)]
struct SessionFile<'a> {
    version: &'static str,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    elapsed_seconds: f64,
    config: ConfigSummary<'a>,
    stats: &'a StatsSnapshot,
    pages: &'a [PageSnapshot],
}

/// Writes the session file and builds the run report.
///
/// # Errors
///
/// Returns an error if the session cannot be serialized or written.
pub(super) async fn finalize_run(session: &Arc<Session>, elapsed_seconds: f64) -> Result<RunReport> {
    let stats = session.stats().snapshot();
    let pages: Vec<PageSnapshot> = session.pages().iter().map(|page| page.snapshot()).collect();

    let document = SessionFile {
        version: env!("CARGO_PKG_VERSION"),
        started_at: session.started_at(),
        finished_at: Utc::now(),
        elapsed_seconds,
        config: ConfigSummary::from(session.config()),
        stats: &stats,
        pages: &pages,
    };
    let json = serde_json::to_string_pretty(&document).context("Failed to serialize session")?;
    let session_path: PathBuf = session.file_path(SESSION_FILE);
    tokio::fs::write(&session_path, json)
        .await
        .with_context(|| format!("Failed to write {}", session_path.display()))?;

    info!(
        "Recon finished in {elapsed_seconds:.1}s: {} page(s), session written to {}",
        pages.len(),
        session_path.display()
    );

    Ok(RunReport {
        stats,
        pages,
        session_path,
        elapsed_seconds,
    })
}
