//! TCP connect scan of the configured ports.

use std::sync::Arc;

use anyhow::Result;
use log::{debug, info};
use tokio::net::TcpStream;

use super::subscribe;
use crate::engine::{Agent, Event, Session, Topic};
use crate::error_handling::StatKind;

const ID: &str = "agent:tcp_port_scanner";

/// Probes every configured port of each `Host` and publishes `PortOpen`.
#[derive(Debug, Default)]
pub struct TcpPortScanner;

impl TcpPortScanner {
    pub fn new() -> Self {
        TcpPortScanner
    }

    async fn on_host(&self, session: &Arc<Session>, host: String) {
        for &port in &session.config().ports {
            let session_handle = Arc::clone(session);
            let target = host.clone();
            session
                .tasks()
                .spawn(&format!("{ID} {host}:{port}"), async move {
                    probe(&session_handle, &target, port).await;
                })
                .await;
        }
    }
}

async fn probe(session: &Session, host: &str, port: u16) {
    let timeout = session.config().scan_timeout;
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => {
            info!("[{ID}] {host}:{port} is open");
            session.stats().increment(StatKind::PortsOpen);
            session.bus().publish(Event::PortOpen {
                port,
                host: host.to_string(),
            });
        }
        Ok(Err(e)) => {
            debug!("[{ID}] {host}:{port} is closed: {e}");
            session.stats().increment(StatKind::PortsClosed);
        }
        Err(_) => {
            debug!("[{ID}] {host}:{port} timed out after {timeout:?}");
            session.stats().increment(StatKind::PortsClosed);
        }
    }
}

impl Agent for TcpPortScanner {
    fn id(&self) -> &'static str {
        ID
    }

    fn register(self: Arc<Self>, session: &Arc<Session>) -> Result<()> {
        subscribe(&self, session, Topic::Host, ID, |agent, session, event| async move {
            if let Event::Host(host) = event {
                agent.on_host(&session, host).await;
            }
        });
        Ok(())
    }
}
