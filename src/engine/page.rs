//! Per-URL result record.
//!
//! A [`Page`] is created once by the requester and then only annotated:
//! artifact paths are set and tags appended, never replaced. Mutable state
//! sits behind a lock so every agent can annotate the same page concurrently.

use std::sync::{PoisonError, RwLock};

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use url::Url;

/// Severity class of a [`Tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Danger,
}

/// A finding attached to a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub text: String,
    pub severity: Severity,
    /// Reference URL for the finding
    pub link: String,
}

impl Tag {
    pub fn new(text: impl Into<String>, severity: Severity, link: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity,
            link: link.into(),
        }
    }
}

/// Response header as stored on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Default)]
struct PageState {
    status: String,
    headers: Vec<Header>,
    headers_path: Option<String>,
    body_path: Option<String>,
    screenshot_path: Option<String>,
    has_screenshot: bool,
    tags: Vec<Tag>,
}

/// Result record for one URL.
#[derive(Debug)]
pub struct Page {
    url: Url,
    basename: String,
    state: RwLock<PageState>,
}

/// Point-in-time copy of a page, used for the session file and reports.
#[derive(Debug, Clone, Serialize)]
pub struct PageSnapshot {
    pub url: String,
    pub status: String,
    pub headers: Vec<Header>,
    pub headers_path: Option<String>,
    pub body_path: Option<String>,
    pub screenshot_path: Option<String>,
    pub has_screenshot: bool,
    pub tags: Vec<Tag>,
}

impl Page {
    /// Creates an empty page for `url`.
    ///
    /// # Errors
    ///
    /// Fails when `url` is not an absolute URL with a host.
    pub fn new(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).with_context(|| format!("Invalid page URL {url:?}"))?;
        if parsed.host_str().is_none() {
            anyhow::bail!("Page URL has no host: {url:?}");
        }
        let basename = basename_for(&parsed);
        Ok(Self {
            url: parsed,
            basename,
            state: RwLock::new(PageState::default()),
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn parsed_url(&self) -> &Url {
        &self.url
    }

    /// Host without IPv6 brackets.
    pub fn hostname(&self) -> &str {
        let host = self.url.host_str().unwrap_or_default();
        host.trim_start_matches('[').trim_end_matches(']')
    }

    pub fn is_https(&self) -> bool {
        self.url.scheme() == "https"
    }

    /// Effective port, falling back to the scheme default.
    pub fn port(&self) -> u16 {
        self.url.port_or_known_default().unwrap_or(80)
    }

    /// Filesystem-safe name shared by every artifact of this page.
    pub fn basename(&self) -> &str {
        &self.basename
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, PageState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, PageState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the status line and the response headers in arrival order.
    pub fn set_response(&self, status: impl Into<String>, headers: Vec<(String, String)>) {
        let mut state = self.write();
        state.status = status.into();
        state.headers = headers
            .into_iter()
            .map(|(name, value)| Header { name, value })
            .collect();
    }

    pub fn set_headers_path(&self, path: impl Into<String>) {
        self.write().headers_path = Some(path.into());
    }

    pub fn set_body_path(&self, path: impl Into<String>) {
        self.write().body_path = Some(path.into());
    }

    pub fn set_screenshot_path(&self, path: impl Into<String>) {
        let mut state = self.write();
        state.screenshot_path = Some(path.into());
        state.has_screenshot = true;
    }

    pub fn add_tag(&self, tag: Tag) {
        self.write().tags.push(tag);
    }

    /// Appends `tag` unless a tag with the same text is already present.
    /// Returns whether the tag was added.
    pub fn add_tag_once(&self, tag: Tag) -> bool {
        let mut state = self.write();
        if state.tags.iter().any(|t| t.text == tag.text) {
            return false;
        }
        state.tags.push(tag);
        true
    }

    pub fn status(&self) -> String {
        self.read().status.clone()
    }

    pub fn headers(&self) -> Vec<Header> {
        self.read().headers.clone()
    }

    pub fn body_path(&self) -> Option<String> {
        self.read().body_path.clone()
    }

    pub fn has_screenshot(&self) -> bool {
        self.read().has_screenshot
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.read().tags.clone()
    }

    pub fn snapshot(&self) -> PageSnapshot {
        let state = self.read();
        PageSnapshot {
            url: self.url.to_string(),
            status: state.status.clone(),
            headers: state.headers.clone(),
            headers_path: state.headers_path.clone(),
            body_path: state.body_path.clone(),
            screenshot_path: state.screenshot_path.clone(),
            has_screenshot: state.has_screenshot,
            tags: state.tags.clone(),
        }
    }
}

/// `scheme__host__port__<hash of path, query and fragment>`, lowercased.
///
/// The hash keeps distinct paths on the same endpoint apart without letting
/// path characters leak into file names.
fn basename_for(url: &Url) -> String {
    let host = url
        .host_str()
        .unwrap_or_default()
        .replace(['.', ':', '[', ']'], "_");
    let port = url.port_or_known_default().unwrap_or(0);

    let mut hasher = Sha256::new();
    hasher.update(url.path().as_bytes());
    if let Some(query) = url.query() {
        hasher.update(b"?");
        hasher.update(query.as_bytes());
    }
    if let Some(fragment) = url.fragment() {
        hasher.update(b"#");
        hasher.update(fragment.as_bytes());
    }
    let digest = hasher.finalize();
    let hash: String = digest[..8].iter().map(|b| format!("{b:02x}")).collect();

    format!("{}__{}__{}__{}", url.scheme(), host, port, hash).to_lowercase()
}
