//! Fetches each URL once and records the response on a page.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use url::Url;

use super::subscribe;
use crate::config::{HEADERS_DIR, HTML_DIR, MAX_RESPONSE_BODY_SIZE};
use crate::engine::{Agent, Event, Page, Session, Topic};
use crate::error_handling::StatKind;
use crate::fetch::RequestHeaders;

const ID: &str = "agent:url_requester";

/// Sends one GET per `Url` and publishes `PageResponsive` for accepted
/// responses.
pub struct UrlRequester {
    client: Arc<reqwest::Client>,
    /// URLs already handed to a request task
    claimed: Mutex<HashSet<String>>,
}

impl UrlRequester {
    pub fn new(client: Arc<reqwest::Client>) -> Self {
        UrlRequester {
            client,
            claimed: Mutex::new(HashSet::new()),
        }
    }

    /// Marks `url` as taken. Returns false if another event got there first.
    fn claim(&self, url: &str) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string())
    }

    async fn on_url(self: &Arc<Self>, session: &Arc<Session>, raw: String) {
        let url = match Url::parse(&raw) {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!("[{ID}] Ignoring invalid URL {raw:?}: {e}");
                return;
            }
        };
        if !self.claim(&url) || session.get_page(&url).is_some() {
            debug!("[{ID}] {url} was already requested");
            return;
        }

        let agent = Arc::clone(self);
        let session_handle = Arc::clone(session);
        session
            .tasks()
            .spawn(&format!("{ID} {url}"), async move {
                if let Err(e) = agent.request(&session_handle, &url).await {
                    warn!("[{ID}] {url}: {e:#}");
                }
            })
            .await;
    }

    async fn request(&self, session: &Session, url: &str) -> Result<()> {
        let stats = session.stats();
        let headers = RequestHeaders::random();
        stats.increment(StatKind::RequestsAttempted);

        let response = match headers
            .apply_to_request_builder(self.client.get(url))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                stats.increment(StatKind::RequestsFailed);
                debug!("[{ID}] Request to {url} failed: {e}");
                return Ok(());
            }
        };

        let status = response.status();
        let code = status.as_u16();
        if !session.config().accepts_status(code) {
            stats.increment(StatKind::RequestsFailed);
            debug!("[{ID}] {url} returned filtered status {code}");
            return Ok(());
        }

        stats.increment(StatKind::RequestsSuccessful);
        stats.increment(StatKind::for_status(code));

        let (page, existed) = session.add_page(url)?;
        if existed {
            debug!("[{ID}] {url} was recorded by a concurrent request");
            return Ok(());
        }

        let status_line = match status.canonical_reason() {
            Some(reason) => format!("{code} {reason}"),
            None => code.to_string(),
        };
        let response_headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).to_string(),
                )
            })
            .collect();

        // The page is registered now, so artifact failures are logged and the
        // page is still published.
        if let Err(e) = write_headers(session, &page, &status_line, &response_headers).await {
            warn!("[{ID}] {url}: {e:#}");
        }
        page.set_response(status_line, response_headers);

        if session.config().save_body {
            if let Err(e) = write_body(session, &page, response).await {
                warn!("[{ID}] {url}: {e:#}");
            }
        }

        info!("[{ID}] {url} {}", page.status());
        session.bus().publish(Event::PageResponsive(page.url().to_string()));
        Ok(())
    }
}

async fn write_headers(
    session: &Session,
    page: &Page,
    status_line: &str,
    headers: &[(String, String)],
) -> Result<()> {
    let mut text = format!("{status_line}\n");
    for (name, value) in headers {
        text.push_str(&format!("{name}: {value}\n"));
    }
    let relative = format!("{HEADERS_DIR}/{}.txt", page.basename());
    tokio::fs::write(session.file_path(&relative), text)
        .await
        .with_context(|| format!("failed to write {relative}"))?;
    page.set_headers_path(relative);
    Ok(())
}

/// Saves the body and records its path. A body that cannot be read in full
/// leaves the page without one.
async fn write_body(session: &Session, page: &Page, response: reqwest::Response) -> Result<()> {
    let mut body = response
        .bytes()
        .await
        .context("failed to read response body")?
        .to_vec();
    if body.len() > MAX_RESPONSE_BODY_SIZE {
        debug!("[{ID}] Truncating {} byte body from {}", body.len(), page.url());
        body.truncate(MAX_RESPONSE_BODY_SIZE);
    }
    let relative = format!("{HTML_DIR}/{}.html", page.basename());
    tokio::fs::write(session.file_path(&relative), &body)
        .await
        .with_context(|| format!("failed to write {relative}"))?;
    page.set_body_path(relative);
    Ok(())
}

impl Agent for UrlRequester {
    fn id(&self) -> &'static str {
        ID
    }

    fn register(self: Arc<Self>, session: &Arc<Session>) -> Result<()> {
        subscribe(&self, session, Topic::Url, ID, |agent, session, event| async move {
            if let Event::Url(url) = event {
                agent.on_url(&session, url).await;
            }
        });
        Ok(())
    }
}
