//! DNS resolver initialization.

use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

/// Initializes the DNS resolver used by takeover detection.
///
/// Uses the system configuration when it can be read and falls back to the
/// default public resolvers otherwise. Timeouts are short so an unresponsive
/// server only stalls the one host being examined.
pub fn init_resolver() -> Arc<TokioAsyncResolver> {
    let (config, mut opts) = match hickory_resolver::system_conf::read_system_conf() {
        Ok(system) => system,
        Err(e) => {
            log::debug!("Unable to read system DNS configuration, using defaults: {e}");
            (ResolverConfig::default(), ResolverOpts::default())
        }
    };
    opts.timeout = Duration::from_secs(crate::config::DNS_TIMEOUT_SECS);
    opts.attempts = 2;
    // Queries are always fully qualified; never append search domains
    opts.ndots = 0;

    Arc::new(TokioAsyncResolver::tokio(config, opts))
}
