// Shared test doubles and configuration for the integration tests.

use std::net::IpAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use page_recon::{Capture, CaptureRequest, Capturer, Config, HostResolver, Resolution};

/// Config suited to a local mock server: fast timeouts, bodies saved.
#[allow(dead_code)]
pub fn test_config(out_dir: &Path) -> Config {
    Config {
        out_dir: out_dir.to_path_buf(),
        threads: 4,
        scan_timeout: Duration::from_millis(500),
        http_timeout: Duration::from_secs(5),
        screenshot_timeout: Duration::from_millis(500),
        save_body: true,
        ..Config::default()
    }
}

/// Returns a fixed PNG, or hangs past any timeout for URLs containing
/// `hang_on`.
#[allow(dead_code)]
pub struct FakeCapturer {
    pub hang_on: Option<&'static str>,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeCapturer {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeCapturer {
            hang_on: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn hanging_on(fragment: &'static str) -> Arc<Self> {
        Arc::new(FakeCapturer {
            hang_on: Some(fragment),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Capturer for FakeCapturer {
    async fn capture(&self, request: CaptureRequest) -> Result<Capture> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_on.is_some_and(|fragment| request.url.contains(fragment)) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        Ok(Capture {
            png: b"\x89PNG\r\n\x1a\n".to_vec(),
            prototype_polluted: false,
        })
    }
}

/// Answers every lookup with the same CNAME and counts calls.
#[allow(dead_code)]
pub struct FakeResolver {
    pub cname: String,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeResolver {
    pub fn with_cname(cname: &str) -> Arc<Self> {
        Arc::new(FakeResolver {
            cname: cname.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostResolver for FakeResolver {
    async fn resolve(&self, _host: &str) -> Result<Resolution> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Resolution {
            addrs: vec![IpAddr::from([127, 0, 0, 1])],
            cname: self.cname.clone(),
        })
    }
}

/// Fails every lookup, counting calls.
#[allow(dead_code)]
#[derive(Default)]
pub struct FailingResolver {
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl FailingResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(FailingResolver::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostResolver for FailingResolver {
    async fn resolve(&self, host: &str) -> Result<Resolution> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("no answer for {host}")
    }
}
