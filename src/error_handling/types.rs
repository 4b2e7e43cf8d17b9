//! Error type definitions.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use thiserror::Error;

/// Error types for initialization failures.
///
/// Any of these is fatal for a run: no useful work can proceed without the
/// resource.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error creating a scoped temporary resource (browser profile, output dirs).
    #[error("Unable to create {what}: {source}")]
    ResourceError {
        /// What was being created
        what: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Error loading the technology fingerprint database.
    #[error("Fingerprint database error: {0}")]
    FingerprintError(String),
}

/// Error types for invalid configuration values.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A port or port list that could not be parsed.
    #[error("Invalid port specification: {0:?}")]
    InvalidPort(String),

    /// A status code outside 100-599 or not a number.
    #[error("Invalid status code: {0:?}")]
    InvalidStatusCode(String),

    /// An `--http-header` value without a `Name: Value` shape.
    #[error("Invalid header (expected \"Name: Value\"): {0:?}")]
    InvalidHeader(String),

    /// A `--resolution` value without a `width,height` shape.
    #[error("Invalid resolution (expected \"width,height\"): {0:?}")]
    InvalidResolution(String),

    /// A numeric option outside its accepted range.
    #[error("Value {value} is out of range for --{option}")]
    OutOfRange {
        /// Option name
        option: &'static str,
        /// Offending value
        value: String,
    },
}

/// Error types for a single TLS handshake probe.
#[derive(Error, Debug)]
pub enum TlsProbeError {
    /// The host is neither a DNS name nor an IP literal.
    #[error("Invalid server name: {0}")]
    InvalidServerName(String),

    /// TCP connect failed.
    #[error("TCP connect failed: {0}")]
    Connect(#[source] std::io::Error),

    /// Connect or handshake exceeded the deadline.
    #[error("TLS probe timed out")]
    Timeout,

    /// The peer and rustls could not agree on a session.
    #[error("TLS handshake failed: {0}")]
    Handshake(#[from] rustls::Error),

    /// Transport failure during the handshake.
    #[error("TLS transport error: {0}")]
    Io(#[source] std::io::Error),
}

impl TlsProbeError {
    /// True when the handshake failed because the peer only speaks a protocol
    /// version older than TLS 1.2.
    pub fn is_legacy_protocol(&self) -> bool {
        use rustls::{AlertDescription, PeerIncompatible};
        match self {
            TlsProbeError::Handshake(rustls::Error::AlertReceived(
                AlertDescription::ProtocolVersion,
            )) => true,
            TlsProbeError::Handshake(rustls::Error::PeerIncompatible(
                PeerIncompatible::ServerDoesNotSupportTls12Or13
                | PeerIncompatible::ServerTlsVersionIsDisabledByOurConfig,
            )) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::InvalidPort("abc".into()).to_string(),
            "Invalid port specification: \"abc\""
        );
        assert_eq!(
            ConfigError::OutOfRange {
                option: "threads",
                value: "0".into()
            }
            .to_string(),
            "Value 0 is out of range for --threads"
        );
    }

    #[test]
    fn test_resource_error_keeps_source() {
        let err = InitializationError::ResourceError {
            what: "browser profile directory".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("browser profile directory"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_legacy_protocol_detection() {
        let legacy = TlsProbeError::Handshake(rustls::Error::AlertReceived(
            rustls::AlertDescription::ProtocolVersion,
        ));
        assert!(legacy.is_legacy_protocol());

        let incompatible = TlsProbeError::Handshake(rustls::Error::PeerIncompatible(
            rustls::PeerIncompatible::ServerDoesNotSupportTls12Or13,
        ));
        assert!(incompatible.is_legacy_protocol());

        assert!(!TlsProbeError::Timeout.is_legacy_protocol());
        let refused = TlsProbeError::Connect(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(!refused.is_legacy_protocol());
    }
}
