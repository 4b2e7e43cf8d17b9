//! Subdomain takeover detection.

use std::net::IpAddr;
use std::sync::Arc;

use anyhow::Result;
use log::{debug, info, warn};

use super::subscribe;
use crate::dns::HostResolver;
use crate::engine::{Agent, Event, Page, Session, Topic};
use crate::takeover::{evaluate_rules, TakeoverVerdict};

const ID: &str = "agent:url_takeover_detector";

/// Resolves each responsive page's host and runs the takeover rules against
/// its DNS answer and saved body.
pub struct UrlTakeoverDetector {
    resolver: Arc<dyn HostResolver>,
}

impl UrlTakeoverDetector {
    pub fn new(resolver: Arc<dyn HostResolver>) -> Self {
        UrlTakeoverDetector { resolver }
    }

    async fn on_page_responsive(self: &Arc<Self>, session: &Arc<Session>, url: String) {
        let Some(page) = session.get_page(&url) else {
            warn!("[{ID}] No page recorded for {url}");
            return;
        };
        if page.hostname().parse::<IpAddr>().is_ok() {
            debug!("[{ID}] Skipping takeover detection on IP URL {url}");
            return;
        }
        let agent = Arc::clone(self);
        let session_handle = Arc::clone(session);
        session
            .tasks()
            .spawn(&format!("{ID} {url}"), async move {
                agent.detect(&session_handle, &page).await;
            })
            .await;
    }

    async fn detect(&self, session: &Session, page: &Page) {
        let host = page.hostname();
        let resolution = match self.resolver.resolve(host).await {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!("[{ID}] Unable to resolve {host}: {e:#}");
                return;
            }
        };
        debug!(
            "[{ID}] {host} resolves to {:?} via {}",
            resolution.addrs, resolution.cname
        );

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

        match evaluate_rules(&resolution, &body) {
            TakeoverVerdict::Vulnerable(rule) => {
                warn!("[{ID}] {host} is vulnerable to {} takeover", rule.provider);
                page.add_tag(rule.tag());
            }
            TakeoverVerdict::Provider(rule) => {
                info!("[{ID}] {host} is hosted on {}", rule.provider);
            }
            TakeoverVerdict::NoProvider => {}
        }
    }
}

impl Agent for UrlTakeoverDetector {
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
