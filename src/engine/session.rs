//! Shared state for one recon run.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::barrier::TaskGroup;
use super::bus::EventBus;
use super::page::Page;
use crate::config::Config;
use crate::error_handling::RunStats;

/// Process-wide run state: the page registry, counters, configuration, the
/// event bus and the completion barrier.
///
/// Handlers subscribed on the bus hold `Arc<Session>`; [`EventBus::close`]
/// breaks that cycle once the run has drained.
pub struct Session {
    config: Arc<Config>,
    pages: Mutex<HashMap<String, Arc<Page>>>,
    stats: RunStats,
    bus: EventBus,
    tasks: TaskGroup,
    started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(config: Arc<Config>) -> Arc<Self> {
        let tasks = TaskGroup::new(config.threads);
        Arc::new(Self {
            bus: EventBus::new(tasks.clone()),
            tasks,
            pages: Mutex::new(HashMap::new()),
            stats: RunStats::new(),
            started_at: Utc::now(),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn tasks(&self) -> &TaskGroup {
        &self.tasks
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the page for `url`, creating it if needed, and whether it
    /// already existed.
    ///
    /// Concurrent callers with the same URL all receive the same instance;
    /// exactly one of them sees `false`.
    ///
    /// # Errors
    ///
    /// Fails when `url` cannot be parsed into a page.
    pub fn add_page(&self, url: &str) -> Result<(Arc<Page>, bool)> {
        let mut pages = self.pages.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(page) = pages.get(url) {
            return Ok((Arc::clone(page), true));
        }
        let page = Arc::new(Page::new(url)?);
        pages.insert(url.to_string(), Arc::clone(&page));
        Ok((page, false))
    }

    pub fn get_page(&self, url: &str) -> Option<Arc<Page>> {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }

    /// All pages, ordered by URL.
    pub fn pages(&self) -> Vec<Arc<Page>> {
        let pages = self.pages.lock().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<_> = pages.values().cloned().collect();
        all.sort_by(|a, b| a.url().cmp(b.url()));
        all
    }

    /// Absolute path of an artifact relative to the output directory.
    pub fn file_path(&self, relative: &str) -> PathBuf {
        self.config.out_dir.join(relative)
    }

    /// Reads an artifact written earlier in the run.
    pub async fn read_file(&self, relative: &str) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.file_path(relative)).await
    }
}
