//! Flags HTTPS pages served over outdated TLS.

use std::sync::Arc;

use anyhow::Result;
use log::{debug, warn};
use rustls::ProtocolVersion;

use super::subscribe;
use crate::engine::{Agent, Event, Page, Session, Severity, Tag, Topic};
use crate::error_handling::TlsProbeError;
use crate::tls;

const ID: &str = "agent:url_tls_checker";

const TLS_REFERENCE: &str =
    "https://www.acunetix.com/blog/articles/tls-vulnerabilities-attacks-final-part/";

/// Tag for a handshake outcome, if it warrants one.
pub(crate) fn tls_tag(outcome: &Result<ProtocolVersion, TlsProbeError>) -> Option<Tag> {
    match outcome {
        Ok(version) if tls::is_outdated(*version) => Some(Tag::new(
            format!("Insecure {}", tls::version_name(*version)),
            Severity::Warning,
            TLS_REFERENCE,
        )),
        Err(e) if e.is_legacy_protocol() => Some(Tag::new(
            "Insecure legacy TLS",
            Severity::Warning,
            TLS_REFERENCE,
        )),
        _ => None,
    }
}

/// Re-handshakes with every HTTPS page and tags old protocol versions.
#[derive(Debug, Default)]
pub struct UrlTlsChecker;

impl UrlTlsChecker {
    pub fn new() -> Self {
        UrlTlsChecker
    }

    async fn on_page_responsive(&self, session: &Arc<Session>, url: String) {
        let Some(page) = session.get_page(&url) else {
            warn!("[{ID}] No page recorded for {url}");
            return;
        };
        if !page.is_https() {
            return;
        }
        let session_handle = Arc::clone(session);
        session
            .tasks()
            .spawn(&format!("{ID} {url}"), async move {
                check(&session_handle, &page).await;
            })
            .await;
    }
}

async fn check(session: &Session, page: &Page) {
    let outcome = tls::handshake(page.hostname(), page.port(), session.config().scan_timeout).await;
    match &outcome {
        Ok(version) => debug!("[{ID}] {} uses {}", page.url(), tls::version_name(*version)),
        Err(e) => debug!("[{ID}] Unable to identify TLS version for {}: {e}", page.url()),
    }
    if let Some(tag) = tls_tag(&outcome) {
        warn!("[{ID}] {}: {}", page.url(), tag.text);
        page.add_tag_once(tag);
    }
}

impl Agent for UrlTlsChecker {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modern_versions_are_not_tagged() {
        assert!(tls_tag(&Ok(ProtocolVersion::TLSv1_2)).is_none());
        assert!(tls_tag(&Ok(ProtocolVersion::TLSv1_3)).is_none());
        assert!(tls_tag(&Err(TlsProbeError::Timeout)).is_none());
    }

    #[test]
    fn test_outdated_versions_are_tagged() {
        let tag = tls_tag(&Ok(ProtocolVersion::TLSv1_0)).unwrap();
        assert_eq!(tag.text, "Insecure TLS 1.0");
        assert_eq!(tag.severity, Severity::Warning);

        let legacy = Err(TlsProbeError::Handshake(rustls::Error::AlertReceived(
            rustls::AlertDescription::ProtocolVersion,
        )));
        assert_eq!(tls_tag(&legacy).unwrap().text, "Insecure legacy TLS");
    }

    #[tokio::test]
    async fn test_plain_http_pages_are_skipped() {
        let session = Session::new(Arc::new(crate::config::Config::default()));
        Arc::new(UrlTlsChecker::new()).register(&session).unwrap();
        let (page, _) = session.add_page("http://127.0.0.1:9/").unwrap();
        session.bus().publish(Event::PageResponsive(page.url().to_string()));
        session.tasks().join_all().await;
        session.bus().close();
        assert!(page.tags().is_empty());
    }
}
