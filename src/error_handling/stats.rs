//! Run statistics tracking.
//!
//! Monotonic counters for requests, response buckets, screenshots and port
//! probes. Any agent may bump them concurrently; they are read at reporting
//! time only.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::EnumIter as EnumIterMacro;

/// Counters kept for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum StatKind {
    PortsOpen,
    PortsClosed,
    RequestsAttempted,
    RequestsSuccessful,
    RequestsFailed,
    ResponseCode2xx,
    ResponseCode3xx,
    ResponseCode4xx,
    ResponseCode5xx,
    ScreenshotsAttempted,
    ScreenshotsSuccessful,
    ScreenshotsFailed,
}

impl StatKind {
    /// Stable key used in the session file.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::PortsOpen => "ports_open",
            StatKind::PortsClosed => "ports_closed",
            StatKind::RequestsAttempted => "requests_attempted",
            StatKind::RequestsSuccessful => "requests_successful",
            StatKind::RequestsFailed => "requests_failed",
            StatKind::ResponseCode2xx => "response_code_2xx",
            StatKind::ResponseCode3xx => "response_code_3xx",
            StatKind::ResponseCode4xx => "response_code_4xx",
            StatKind::ResponseCode5xx => "response_code_5xx",
            StatKind::ScreenshotsAttempted => "screenshots_attempted",
            StatKind::ScreenshotsSuccessful => "screenshots_successful",
            StatKind::ScreenshotsFailed => "screenshots_failed",
        }
    }

    /// Human-readable label for the summary.
    pub fn label(&self) -> &'static str {
        match self {
            StatKind::PortsOpen => "Open ports",
            StatKind::PortsClosed => "Closed ports",
            StatKind::RequestsAttempted => "Requests attempted",
            StatKind::RequestsSuccessful => "Requests successful",
            StatKind::RequestsFailed => "Requests failed",
            StatKind::ResponseCode2xx => "2xx responses",
            StatKind::ResponseCode3xx => "3xx responses",
            StatKind::ResponseCode4xx => "4xx responses",
            StatKind::ResponseCode5xx => "5xx responses",
            StatKind::ScreenshotsAttempted => "Screenshots attempted",
            StatKind::ScreenshotsSuccessful => "Screenshots successful",
            StatKind::ScreenshotsFailed => "Screenshots failed",
        }
    }

    /// Response bucket for an HTTP status code.
    pub fn for_status(code: u16) -> StatKind {
        match code {
            500.. => StatKind::ResponseCode5xx,
            400..=499 => StatKind::ResponseCode4xx,
            300..=399 => StatKind::ResponseCode3xx,
            _ => StatKind::ResponseCode2xx,
        }
    }
}

/// Thread-safe run counters.
///
/// Every [`StatKind`] is initialized to zero on creation, so increments never
/// allocate and never need a lock.
pub struct RunStats {
    counters: HashMap<StatKind, AtomicUsize>,
}

impl RunStats {
    pub fn new() -> Self {
        let counters = StatKind::iter()
            .map(|kind| (kind, AtomicUsize::new(0)))
            .collect();
        RunStats { counters }
    }

    /// Increment a counter.
    pub fn increment(&self, kind: StatKind) {
        if let Some(counter) = self.counters.get(&kind) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment counter for {:?} which is not in the map. \
                 This indicates a bug in RunStats initialization.",
                kind
            );
        }
    }

    /// Get the current value of a counter.
    pub fn get(&self, kind: StatKind) -> usize {
        self.counters
            .get(&kind)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot(
            StatKind::iter()
                .map(|kind| (kind.as_str(), self.get(kind)))
                .collect(),
        )
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable copy of [`RunStats`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct StatsSnapshot(pub BTreeMap<&'static str, usize>);

impl StatsSnapshot {
    /// Value of a counter in this snapshot.
    pub fn get(&self, kind: StatKind) -> usize {
        self.0.get(kind.as_str()).copied().unwrap_or(0)
    }
}
