//! Headless Chrome capturer.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions, Tab};

use super::{Capture, CaptureRequest, Capturer};
use crate::config::{Config, BROWSER_USER_AGENT};

/// Overrides blocking dialogs so a page cannot stall the capture.
const DIALOG_OVERRIDE_JS: &str =
    "window.alert = window.confirm = window.prompt = function (txt) { return txt }";

const CHROME_ARGS: &[&str] = &[
    "--incognito",
    "--disable-extensions",
    "--no-first-run",
    "--disable-crash-reporter",
    "--disable-gpu",
];

/// Launches one headless Chrome per capture.
///
/// Every launch gets its own profile directory below the request's
/// `profile_dir`; the browser process exits when the capture returns.
pub struct ChromeCapturer {
    config: Arc<Config>,
    launches: AtomicU64,
}

impl ChromeCapturer {
    pub fn new(config: Arc<Config>) -> Self {
        ChromeCapturer {
            config,
            launches: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl Capturer for ChromeCapturer {
    async fn capture(&self, request: CaptureRequest) -> Result<Capture> {
        let config = Arc::clone(&self.config);
        let sequence = self.launches.fetch_add(1, Ordering::Relaxed);
        let user_data_dir = request.profile_dir.join(format!("profile-{sequence}"));

        tokio::task::spawn_blocking(move || capture_blocking(&config, &request, user_data_dir))
            .await
            .context("screenshot task aborted")?
    }
}

fn capture_blocking(
    config: &Config,
    request: &CaptureRequest,
    user_data_dir: PathBuf,
) -> Result<Capture> {
    let options = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .ignore_certificate_errors(true)
        .window_size(Some(config.resolution))
        .user_data_dir(Some(user_data_dir))
        .path(config.chrome_path.clone())
        .proxy_server(config.proxy.as_deref())
        .idle_browser_timeout(request.timeout)
        .args(CHROME_ARGS.iter().map(OsStr::new).collect())
        .build()
        .map_err(|e| anyhow!("invalid browser options: {e}"))?;

    let browser = Browser::new(options).context("failed to launch browser")?;
    let tab = browser.new_tab().context("failed to open tab")?;
    tab.set_default_timeout(request.timeout);
    tab.set_user_agent(BROWSER_USER_AGENT, None, None)?;

    if !config.http_headers.is_empty() {
        let headers: HashMap<&str, &str> = config
            .http_headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        tab.set_extra_http_headers(headers)?;
    }

    let dialog_opened = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&dialog_opened);
    tab.add_event_listener(Arc::new(move |event: &Event| {
        if let Event::PageJavascriptDialogOpening(_) = event {
            flag.store(true, Ordering::SeqCst);
        }
    }))?;

    tab.navigate_to(&request.url)?.wait_until_navigated()?;
    std::thread::sleep(request.delay);

    tab.evaluate(DIALOG_OVERRIDE_JS, false)?;
    let prototype_polluted = tab
        .evaluate("window.foo", false)?
        .value
        .as_ref()
        .and_then(|v| v.as_str())
        .is_some_and(|v| v == "polluted");

    let clip = if request.full_page {
        Some(full_page_clip(&tab)?)
    } else {
        None
    };
    let png = tab.capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, clip, true)?;

    if dialog_opened.load(Ordering::SeqCst) {
        bail!("page opened a javascript dialog");
    }

    Ok(Capture {
        png,
        prototype_polluted,
    })
}

fn full_page_clip(tab: &Tab) -> Result<Page::Viewport> {
    let dimension = |expr: &str| -> Result<f64> {
        tab.evaluate(expr, false)?
            .value
            .as_ref()
            .and_then(|v| v.as_f64())
            .ok_or_else(|| anyhow!("could not read page size"))
    };
    Ok(Page::Viewport {
        x: 0.0,
        y: 0.0,
        width: dimension("document.documentElement.scrollWidth")?,
        height: dimension("document.documentElement.scrollHeight")?,
        scale: 1.0,
    })
}
