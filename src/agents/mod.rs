//! Pipeline agents.
//!
//! Each agent subscribes to one or two topics and turns events into I/O and
//! further events:
//!
//! ```text
//! Host ─▶ tcp_port_scanner ─▶ PortOpen ─▶ url_publisher ─▶ Url ─▶ url_requester
//!                                                                    │
//!                     PageResponsive ◀───────────────────────────────┘
//!                       ├─▶ url_screenshotter
//!                       ├─▶ url_tls_checker
//!                       ├─▶ url_technology_fingerprinter
//!                       └─▶ url_takeover_detector
//! ```

mod tcp_port_scanner;
mod url_publisher;
mod url_requester;
mod url_screenshotter;
mod url_takeover_detector;
mod url_technology_fingerprinter;
mod url_tls_checker;

use std::future::Future;
use std::sync::Arc;

use crate::engine::{Event, Session, Topic};

pub use tcp_port_scanner::TcpPortScanner;
pub use url_publisher::{build_url, classify_scheme, UrlPublisher};
pub use url_requester::UrlRequester;
pub use url_screenshotter::UrlScreenshotter;
pub use url_takeover_detector::UrlTakeoverDetector;
pub use url_technology_fingerprinter::UrlTechnologyFingerprinter;
pub use url_tls_checker::UrlTlsChecker;

/// Subscribes `agent` to `topic`, handing each event to `handler` along with
/// the agent and the session.
fn subscribe<A, F, Fut>(agent: &Arc<A>, session: &Arc<Session>, topic: Topic, id: &str, handler: F)
where
    A: Send + Sync + 'static,
    F: Fn(Arc<A>, Arc<Session>, Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let agent = Arc::clone(agent);
    let handle = Arc::clone(session);
    session.bus().subscribe(topic, id, move |event| {
        handler(Arc::clone(&agent), Arc::clone(&handle), event)
    });
}
