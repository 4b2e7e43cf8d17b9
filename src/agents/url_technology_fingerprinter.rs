//! Tags pages with the technologies their response reveals.

use std::sync::Arc;

use anyhow::Result;
use log::{debug, warn};

use super::subscribe;
use crate::engine::{Agent, Event, Page, Session, Severity, Tag, Topic};
use crate::fingerprint::FingerprintDb;

const ID: &str = "agent:url_technology_fingerprinter";

pub struct UrlTechnologyFingerprinter {
    db: Arc<FingerprintDb>,
}

impl UrlTechnologyFingerprinter {
    pub fn new(db: Arc<FingerprintDb>) -> Self {
        UrlTechnologyFingerprinter { db }
    }

    async fn on_page_responsive(self: &Arc<Self>, session: &Arc<Session>, url: String) {
        let Some(page) = session.get_page(&url) else {
            warn!("[{ID}] No page recorded for {url}");
            return;
        };
        let agent = Arc::clone(self);
        let session_handle = Arc::clone(session);
        session
            .tasks()
            .spawn(&format!("{ID} {url}"), async move {
                agent.fingerprint(&session_handle, &page).await;
            })
            .await;
    }

    async fn fingerprint(&self, session: &Session, page: &Page) {
        let Some(body_path) = page.body_path() else {
            debug!("[{ID}] No saved body for {}, skipping", page.url());
            return;
        };
        let body = match session.read_file(&body_path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                debug!("[{ID}] Error reading body of {}: {e}", page.url());
                return;
            }
        };

        for detection in self.db.detect(&page.headers(), &body) {
            debug!("[{ID}] {} uses {}", page.url(), detection.name);
            let link = if detection.website.is_empty() {
                "about:blank".to_string()
            } else {
                detection.website
            };
            page.add_tag(Tag::new(detection.name, Severity::Info, link));
        }
    }
}

impl Agent for UrlTechnologyFingerprinter {
    fn id(&self) -> &'static str {
        ID
    }

    fn register(self: Arc<Self>, session: &Arc<Session>) -> Result<()> {
        subscribe(&self, session, Topic::PageResponsive, ID, |agent, session, event| async move {
            if let Event::PageResponsive(url) = event {
                agent.on_page_responsive(&session, url).await;
            }
        });
        Ok(())
    }
}
