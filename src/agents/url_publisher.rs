//! Turns open ports into URLs.

use std::net::IpAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, warn};
use url::Url;

use super::subscribe;
use crate::engine::{Agent, Event, Session, Topic};
use crate::tls;

const ID: &str = "agent:url_publisher";

/// Scheme for a port when it can be decided without touching the network.
///
/// Port 80 is plain HTTP and any port whose decimal form ends in `443` is
/// HTTPS. Everything else needs a handshake.
pub fn classify_scheme(port: u16) -> Option<&'static str> {
    if port == 80 {
        Some("http")
    } else if port.to_string().ends_with("443") {
        Some("https")
    } else {
        None
    }
}

/// Builds the normalized root URL for an endpoint.
pub fn build_url(scheme: &str, host: &str, port: u16) -> Result<String> {
    let host = match host.parse::<IpAddr>() {
        Ok(IpAddr::V6(addr)) => format!("[{addr}]"),
        _ => host.to_string(),
    };
    let url = Url::parse(&format!("{scheme}://{host}:{port}/"))
        .with_context(|| format!("cannot build URL for {host}:{port}"))?;
    Ok(url.to_string())
}

/// Classifies each `PortOpen` as HTTP or HTTPS and publishes `Url`.
#[derive(Debug, Default)]
pub struct UrlPublisher;

impl UrlPublisher {
    pub fn new() -> Self {
        UrlPublisher
    }

    async fn on_port_open(&self, session: &Arc<Session>, host: String, port: u16) {
        let session_handle = Arc::clone(session);
        session
            .tasks()
            .spawn(&format!("{ID} {host}:{port}"), async move {
                publish(&session_handle, &host, port).await;
            })
            .await;
    }
}

async fn publish(session: &Session, host: &str, port: u16) {
    let scheme = match classify_scheme(port) {
        Some(scheme) => scheme,
        None => match tls::handshake(host, port, session.config().scan_timeout).await {
            Ok(_) => "https",
            Err(e) => {
                debug!("[{ID}] {host}:{port} did not complete a TLS handshake ({e}), using http");
                "http"
            }
        },
    };

    match build_url(scheme, host, port) {
        Ok(url) => {
            debug!("[{ID}] Publishing {url}");
            session.bus().publish(Event::Url(url));
        }
        Err(e) => warn!("[{ID}] {e:#}"),
    }
}

impl Agent for UrlPublisher {
    fn id(&self) -> &'static str {
        ID
    }

    fn register(self: Arc<Self>, session: &Arc<Session>) -> Result<()> {
        subscribe(&self, session, Topic::PortOpen, ID, |agent, session, event| async move {
            if let Event::PortOpen { port, host } = event {
                agent.on_port_open(&session, host, port).await;
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_ports() {
        assert_eq!(classify_scheme(80), Some("http"));
        assert_eq!(classify_scheme(443), Some("https"));
        assert_eq!(classify_scheme(8443), Some("https"));
        assert_eq!(classify_scheme(10443), Some("https"));
        assert_eq!(classify_scheme(8080), None);
        assert_eq!(classify_scheme(4430), None);
        assert_eq!(classify_scheme(8000), None);
    }

    #[test]
    fn test_build_url_omits_default_ports() {
        assert_eq!(build_url("http", "Example.COM", 80).unwrap(), "http://example.com/");
        assert_eq!(build_url("https", "example.com", 443).unwrap(), "https://example.com/");
        assert_eq!(
            build_url("https", "example.com", 8443).unwrap(),
            "https://example.com:8443/"
        );
        assert_eq!(build_url("http", "::1", 8080).unwrap(), "http://[::1]:8080/");
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_classification_needs_no_probe_for_443_suffix(prefix in 0u16..=64) {
            let port: u16 = format!("{prefix}443").parse().unwrap();
            prop_assert_eq!(classify_scheme(port), Some("https"));
        }

        #[test]
        fn test_other_ports_need_a_probe(port in 1u16..=65535) {
            prop_assume!(port != 80 && !port.to_string().ends_with("443"));
            prop_assert_eq!(classify_scheme(port), None);
        }
    }
}
