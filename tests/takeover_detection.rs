//! Takeover detection through the rule table and through the pipeline.

mod helpers;

use std::net::IpAddr;

use httptest::{matchers::*, responders::*, Expectation, Server};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use helpers::{test_config, FailingResolver, FakeCapturer, FakeResolver};
use page_recon::{evaluate_rules, Recon, Resolution, Severity, TakeoverVerdict, Target, RULES};

fn resolution(cname: &str) -> Resolution {
    Resolution {
        addrs: vec![IpAddr::from([203, 0, 113, 7])],
        cname: cname.to_string(),
    }
}

#[test]
fn test_s3_bucket_missing_is_vulnerable() {
    let verdict = evaluate_rules(
        &resolution("example.amazonaws.com."),
        "<Error><Code>NoSuchBucket</Code></Error>",
    );
    let tag = verdict.tag().expect("danger tag");
    assert_eq!(tag.text, "Amazon S3 domain takeover");
    assert_eq!(tag.severity, Severity::Danger);
    assert_eq!(verdict.provider(), Some("Amazon S3"));
}

#[test]
fn test_provider_match_without_fingerprint_stops_evaluation() {
    // The body carries Heroku's fingerprint but the CNAME belongs to S3
    let verdict = evaluate_rules(&resolution("example.amazonaws.com."), "No such app");
    assert!(matches!(verdict, TakeoverVerdict::Provider(rule) if rule.provider == "Amazon S3"));
    assert!(verdict.tag().is_none());
}

#[test]
fn test_unknown_cname_has_no_provider() {
    let verdict = evaluate_rules(&resolution("www.example.org."), "NoSuchBucket");
    assert!(matches!(verdict, TakeoverVerdict::NoProvider));
}

#[test]
fn test_rule_table_is_ordered_and_unique() {
    assert_eq!(RULES.first().map(|r| r.provider), Some("GitHub Pages"));
    assert_eq!(RULES.last().map(|r| r.provider), Some("Ngrok"));
    let mut names: Vec<&str> = RULES.iter().map(|r| r.provider).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), RULES.len());
}

#[tokio::test]
async fn test_ip_literal_host_skips_dns() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/"))
            .respond_with(status_code(404).body("NoSuchBucket")),
    );

    let out = TempDir::new().unwrap();
    let resolver = FakeResolver::with_cname("example.amazonaws.com.");
    let report = Recon::new(test_config(out.path()))
        .with_capturer(FakeCapturer::new())
        .with_resolver(resolver.clone())
        .run(vec![Target::Url(server.url_str("/"))])
        .await
        .unwrap();

    assert_eq!(resolver.calls(), 0);
    assert!(report.pages[0]
        .tags
        .iter()
        .all(|tag| tag.severity != Severity::Danger));
}

#[tokio::test]
async fn test_named_host_is_tagged_once() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/")).respond_with(
            status_code(404)
                .body("<Code>NoSuchBucket</Code> The specified bucket does not exist"),
        ),
    );

    let out = TempDir::new().unwrap();
    let resolver = FakeResolver::with_cname("assets.s3.amazonaws.com.");
    let url = format!("http://localhost:{}/", server.addr().port());
    let report = Recon::new(test_config(out.path()))
        .with_capturer(FakeCapturer::new())
        .with_resolver(resolver.clone())
        .run(vec![Target::Url(url)])
        .await
        .unwrap();

    assert_eq!(resolver.calls(), 1);
    let danger: Vec<_> = report.pages[0]
        .tags
        .iter()
        .filter(|tag| tag.severity == Severity::Danger)
        .collect();
    assert_eq!(danger.len(), 1);
    assert_eq!(danger[0].text, "Amazon S3 domain takeover");
}

#[tokio::test]
async fn test_resolution_failure_skips_host() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/"))
            .respond_with(status_code(404).body("<Code>NoSuchBucket</Code>")),
    );

    let out = TempDir::new().unwrap();
    let resolver = FailingResolver::new();
    let url = format!("http://localhost:{}/", server.addr().port());
    let report = Recon::new(test_config(out.path()))
        .with_capturer(FakeCapturer::new())
        .with_resolver(resolver.clone())
        .run(vec![Target::Url(url)])
        .await
        .expect("a DNS failure must not fail the run");

    assert_eq!(resolver.calls(), 1);
    assert_eq!(report.pages.len(), 1);
    assert!(report.pages[0].body_path.is_some());
    assert!(report.pages[0]
        .tags
        .iter()
        .all(|tag| tag.severity != Severity::Danger));
}

/// Serves a response whose body stops well short of its Content-Length.
async fn serve_truncated_body() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let _ = stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 5000\r\n\r\n<html>partial")
                .await;
            let _ = stream.shutdown().await;
        }
    });
    port
}

#[tokio::test]
async fn test_unreadable_body_is_not_treated_as_empty() {
    let port = serve_truncated_body().await;

    let out = TempDir::new().unwrap();
    // SmugMug flags empty bodies, so a missing body must not look empty
    let resolver = FakeResolver::with_cname("domains.smugmug.com.");
    let report = Recon::new(test_config(out.path()))
        .with_capturer(FakeCapturer::new())
        .with_resolver(resolver.clone())
        .run(vec![Target::Url(format!("http://localhost:{port}/"))])
        .await
        .unwrap();

    assert_eq!(report.pages.len(), 1);
    let page = &report.pages[0];
    assert_eq!(page.status, "200 OK");
    assert!(page.headers_path.is_some());
    assert!(page.body_path.is_none());
    assert!(!out.path().join("html").read_dir().unwrap().any(|_| true));
    assert_eq!(resolver.calls(), 1);
    assert!(page.tags.iter().all(|tag| tag.severity != Severity::Danger));
}
