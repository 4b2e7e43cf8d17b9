//! TLS handshake probing.
//!
//! Connects to an endpoint, completes a handshake without validating the
//! certificate and reports the negotiated protocol version. Used to classify
//! open ports as HTTP or HTTPS and to flag outdated TLS deployments.
//!
//! Uses `tokio-rustls` with the `ring` provider passed explicitly, so probes
//! never depend on the process-wide default provider.

mod verifier;

use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ProtocolVersion};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::error_handling::TlsProbeError;

use verifier::AcceptAnyCert;

/// Builds a client config that offers every protocol version rustls supports
/// and accepts any certificate.
fn probe_config() -> Result<Arc<ClientConfig>, rustls::Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_protocol_versions(rustls::ALL_VERSIONS)?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCert::new(provider)))
        .with_no_client_auth();
    Ok(Arc::new(config))
}

/// Performs one TLS handshake against `host:port`.
///
/// `timeout` bounds the TCP connect and the handshake separately.
///
/// # Errors
///
/// Returns a [`TlsProbeError`] describing the first step that failed. Use
/// [`TlsProbeError::is_legacy_protocol`] to tell an outdated server apart from
/// one that does not speak TLS at all.
pub async fn handshake(
    host: &str,
    port: u16,
    timeout: Duration,
) -> Result<ProtocolVersion, TlsProbeError> {
    let config = probe_config()?;
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|_| TlsProbeError::InvalidServerName(host.to_string()))?;

    let sock = match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(sock)) => sock,
        Ok(Err(e)) => return Err(TlsProbeError::Connect(e)),
        Err(_) => return Err(TlsProbeError::Timeout),
    };

    let connector = TlsConnector::from(config);
    let stream = match tokio::time::timeout(timeout, connector.connect(server_name, sock)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(unwrap_rustls_error(e)),
        Err(_) => return Err(TlsProbeError::Timeout),
    };

    let version = stream
        .get_ref()
        .1
        .protocol_version()
        .unwrap_or(ProtocolVersion::Unknown(0));
    log::trace!("TLS handshake with {host}:{port} negotiated {version:?}");
    Ok(version)
}

/// Recovers the rustls error that tokio-rustls wraps in an `io::Error`.
fn unwrap_rustls_error(e: std::io::Error) -> TlsProbeError {
    match e
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
    {
        Some(tls) => TlsProbeError::Handshake(tls.clone()),
        None => TlsProbeError::Io(e),
    }
}

/// Human-readable protocol name, e.g. `TLS 1.2`.
pub fn version_name(version: ProtocolVersion) -> String {
    match version {
        ProtocolVersion::SSLv2 => "SSL 2.0".to_string(),
        ProtocolVersion::SSLv3 => "SSL 3.0".to_string(),
        ProtocolVersion::TLSv1_0 => "TLS 1.0".to_string(),
        ProtocolVersion::TLSv1_1 => "TLS 1.1".to_string(),
        ProtocolVersion::TLSv1_2 => "TLS 1.2".to_string(),
        ProtocolVersion::TLSv1_3 => "TLS 1.3".to_string(),
        other => format!("{other:?}"),
    }
}

/// True for any protocol version older than TLS 1.2.
pub fn is_outdated(version: ProtocolVersion) -> bool {
    matches!(
        version,
        ProtocolVersion::SSLv2
            | ProtocolVersion::SSLv3
            | ProtocolVersion::TLSv1_0
            | ProtocolVersion::TLSv1_1
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_probe_config_builds() {
        assert!(probe_config().is_ok());
    }

    #[test]
    fn test_outdated_versions() {
        assert!(is_outdated(ProtocolVersion::TLSv1_0));
        assert!(is_outdated(ProtocolVersion::TLSv1_1));
        assert!(is_outdated(ProtocolVersion::SSLv3));
        assert!(!is_outdated(ProtocolVersion::TLSv1_2));
        assert!(!is_outdated(ProtocolVersion::TLSv1_3));
    }

    #[test]
    fn test_version_names() {
        assert_eq!(version_name(ProtocolVersion::TLSv1_0), "TLS 1.0");
        assert_eq!(version_name(ProtocolVersion::TLSv1_3), "TLS 1.3");
    }

    #[tokio::test]
    async fn test_handshake_against_plain_http_fails() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            if let Ok((mut sock, _)) = listener.accept().await {
                let _ = sock
                    .write_all(b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\n\r\n")
                    .await;
            }
        });
        let result = handshake("127.0.0.1", port, Duration::from_secs(2)).await;
        let err = result.expect_err("plain HTTP server cannot complete a TLS handshake");
        assert!(!err.is_legacy_protocol());
    }

    #[tokio::test]
    async fn test_handshake_connection_refused() {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let result = handshake("127.0.0.1", port, Duration::from_secs(2)).await;
        assert!(matches!(result, Err(TlsProbeError::Connect(_))));
    }
}
