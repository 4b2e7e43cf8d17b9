//! HTTP client initialization.

use std::sync::Arc;

use reqwest::ClientBuilder;

use crate::config::{Config, MAX_REDIRECT_HOPS};
use crate::error_handling::InitializationError;

/// Initializes the HTTP client used by the requester.
///
/// Creates a `reqwest::Client` configured with:
/// - Timeout from `--http-timeout`
/// - Redirects followed (up to 10 hops) or stopped at the first hop (`--no-redirect`)
/// - Certificate verification disabled (recon targets routinely use self-signed certs)
/// - The configured proxy, if any
///
/// User-Agent and client-IP headers are set per request, not here.
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if the proxy URL is invalid or
/// client creation fails.
pub fn init_client(config: &Config) -> Result<Arc<reqwest::Client>, InitializationError> {
    let redirect = if config.follow_redirects {
        reqwest::redirect::Policy::limited(MAX_REDIRECT_HOPS)
    } else {
        reqwest::redirect::Policy::none()
    };

    let mut builder = ClientBuilder::new()
        .timeout(config.http_timeout)
        .redirect(redirect)
        .danger_accept_invalid_certs(true);

    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
    }

    Ok(Arc::new(builder.build()?))
}
