//! Tests for command-line parsing into a resolved configuration.

use clap::Parser;
use page_recon::{Config, ConfigError, LogFormat, LogLevel, Opt};

fn parse(args: &[&str]) -> Result<Config, ConfigError> {
    let mut argv = vec!["page_recon"];
    argv.extend_from_slice(args);
    Config::try_from(Opt::try_parse_from(argv).expect("arguments should parse"))
}

#[test]
fn test_port_aliases_expand() {
    assert_eq!(parse(&["--ports", "small"]).unwrap().ports, vec![80, 443]);
    let large = parse(&["--ports", "large"]).unwrap().ports;
    assert!(large.contains(&8834));
    let xlarge = parse(&["--ports", "xlarge"]).unwrap().ports;
    assert!(xlarge.len() > large.len());
    assert_eq!(
        parse(&["--ports", "81,8081"]).unwrap().ports,
        vec![81, 8081]
    );
}

#[test]
fn test_invalid_values_are_rejected() {
    assert!(matches!(
        parse(&["--ports", "http"]),
        Err(ConfigError::InvalidPort(_))
    ));
    assert!(matches!(
        parse(&["--match-codes", "200,abc"]),
        Err(ConfigError::InvalidStatusCode(_))
    ));
    assert!(matches!(
        parse(&["--http-header", "NoColon"]),
        Err(ConfigError::InvalidHeader(_))
    ));
    assert!(matches!(
        parse(&["--resolution", "1024x768"]),
        Err(ConfigError::InvalidResolution(_))
    ));
}

#[test]
fn test_output_and_logging_options() {
    let config = parse(&[
        "--out",
        "/tmp/recon",
        "--save-body",
        "--full-page",
        "--log-format",
        "json",
        "--log-level",
        "warn",
        "--http-header",
        "Cookie: session=1",
    ])
    .unwrap();
    assert_eq!(config.out_dir, std::path::PathBuf::from("/tmp/recon"));
    assert!(config.save_body);
    assert!(config.full_page);
    assert_eq!(config.log_format, LogFormat::Json);
    assert_eq!(config.log_level, LogLevel::Warn);
    assert_eq!(
        config.http_headers,
        vec![("Cookie".to_string(), "session=1".to_string())]
    );
}

#[test]
fn test_silent_conflicts_with_debug() {
    assert!(Opt::try_parse_from(["page_recon", "--silent", "--debug"]).is_err());
}
