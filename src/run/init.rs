//! Run resource initialization.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info};

use super::Recon;
use crate::agents::{
    TcpPortScanner, UrlPublisher, UrlRequester, UrlScreenshotter, UrlTakeoverDetector,
    UrlTechnologyFingerprinter, UrlTlsChecker,
};
use crate::browser::{Capturer, ChromeCapturer};
use crate::dns::{HickoryResolver, HostResolver};
use crate::engine::{Agent, Session};
use crate::fingerprint::FingerprintDb;
use crate::initialization::{init_client, init_output_dirs, init_resolver};

/// Creates the session and registers every agent on it.
///
/// # Errors
///
/// Returns an error if an output directory, the HTTP client, the fingerprint
/// database or an agent's scoped resource cannot be created.
pub(super) async fn init_run(recon: Recon) -> Result<Arc<Session>> {
    let Recon {
        config,
        capturer,
        resolver,
        fingerprints,
    } = recon;

    init_output_dirs(&config.out_dir)?;
    let client = init_client(&config)?;

    let fingerprints = match fingerprints {
        Some(db) => db,
        None => Arc::new(FingerprintDb::load(config.fingerprints.as_deref()).await?),
    };
    debug!("Fingerprint database holds {} technologies", fingerprints.len());

    let resolver: Arc<dyn HostResolver> = match resolver {
        Some(resolver) => resolver,
        None => Arc::new(HickoryResolver::new(init_resolver())),
    };
    let capturer: Arc<dyn Capturer> = match capturer {
        Some(capturer) => capturer,
        None => Arc::new(ChromeCapturer::new(Arc::clone(&config))),
    };

    let agents: Vec<Arc<dyn Agent>> = vec![
        Arc::new(TcpPortScanner::new()),
        Arc::new(UrlPublisher::new()),
        Arc::new(UrlRequester::new(client)),
        Arc::new(UrlScreenshotter::new(capturer)),
        Arc::new(UrlTlsChecker::new()),
        Arc::new(UrlTechnologyFingerprinter::new(fingerprints)),
        Arc::new(UrlTakeoverDetector::new(resolver)),
    ];

    let session = Session::new(config);
    for agent in agents {
        let id = agent.id();
        if let Err(e) = agent.register(&session) {
            session.bus().close();
            return Err(e).with_context(|| format!("Failed to register {id}"));
        }
        debug!("Registered {id}");
    }
    info!(
        "Pipeline ready: {} worker slot(s), {} port(s) per host",
        session.config().threads,
        session.config().ports.len()
    );

    Ok(session)
}
