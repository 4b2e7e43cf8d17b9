//! Screenshots every responsive page.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use tempfile::TempDir;

use super::subscribe;
use crate::browser::{probe_url, CaptureRequest, Capturer};
use crate::config::{BROWSER_PROFILE_PREFIX, SCREENSHOTS_DIR};
use crate::engine::{Agent, Event, Page, Session, Severity, Tag, Topic};
use crate::error_handling::{InitializationError, StatKind};

const ID: &str = "agent:url_screenshotter";

const PROTOTYPE_POLLUTION_REFERENCE: &str =
    "https://github.com/BlackFan/client-side-prototype-pollution";

/// Captures `PageResponsive` pages through a [`Capturer`].
///
/// Owns a temporary browser profile directory from registration until
/// `RunEnd`.
pub struct UrlScreenshotter {
    capturer: Arc<dyn Capturer>,
    profile: Mutex<Option<TempDir>>,
}

impl UrlScreenshotter {
    pub fn new(capturer: Arc<dyn Capturer>) -> Self {
        UrlScreenshotter {
            capturer,
            profile: Mutex::new(None),
        }
    }

    fn profile_dir(&self) -> Option<PathBuf> {
        self.profile
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|dir| dir.path().to_path_buf())
    }

    async fn on_page_responsive(self: &Arc<Self>, session: &Arc<Session>, url: String) {
        let Some(page) = session.get_page(&url) else {
            warn!("[{ID}] No page recorded for {url}");
            return;
        };
        let agent = Arc::clone(self);
        let session_handle = Arc::clone(session);
        session
            .tasks()
            .spawn(&format!("{ID} {url}"), async move {
                agent.screenshot(&session_handle, &page).await;
            })
            .await;
    }

    async fn screenshot(&self, session: &Session, page: &Page) {
        let Some(profile_dir) = self.profile_dir() else {
            warn!("[{ID}] Browser profile already released, skipping {}", page.url());
            return;
        };
        let config = session.config();
        let request = CaptureRequest {
            url: probe_url(page.url()),
            profile_dir,
            delay: config.screenshot_delay,
            full_page: config.full_page,
            timeout: config.screenshot_timeout,
        };

        session.stats().increment(StatKind::ScreenshotsAttempted);
        let outcome = match tokio::time::timeout(
            config.screenshot_timeout,
            self.capturer.capture(request),
        )
        .await
        {
            Ok(Ok(capture)) => self.store(session, page, &capture.png).await.map(|()| capture),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(anyhow::anyhow!(
                "timed out after {:?}",
                config.screenshot_timeout
            )),
        };

        match outcome {
            Ok(capture) => {
                session.stats().increment(StatKind::ScreenshotsSuccessful);
                info!("[{ID}] Captured {}", page.url());
                if capture.prototype_polluted {
                    warn!("[{ID}] {} is vulnerable to prototype pollution", page.url());
                    page.add_tag_once(Tag::new(
                        "Prototype Pollution",
                        Severity::Danger,
                        PROTOTYPE_POLLUTION_REFERENCE,
                    ));
                }
            }
            Err(e) => {
                session.stats().increment(StatKind::ScreenshotsFailed);
                debug!("[{ID}] Screenshot of {} failed: {e:#}", page.url());
            }
        }
    }

    async fn store(&self, session: &Session, page: &Page, png: &[u8]) -> Result<()> {
        let relative = format!("{SCREENSHOTS_DIR}/{}.png", page.basename());
        tokio::fs::write(session.file_path(&relative), png)
            .await
            .with_context(|| format!("failed to write {relative}"))?;
        page.set_screenshot_path(relative);
        Ok(())
    }

    fn release_profile(&self) {
        if let Some(dir) = self
            .profile
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            let path = dir.path().display().to_string();
            match dir.close() {
                Ok(()) => debug!("[{ID}] Removed browser profile {path}"),
                Err(e) => warn!("[{ID}] Failed to remove browser profile {path}: {e}"),
            }
        }
    }
}

impl Agent for UrlScreenshotter {
    fn id(&self) -> &'static str {
        ID
    }

    fn register(self: Arc<Self>, session: &Arc<Session>) -> Result<()> {
        let dir = tempfile::Builder::new()
            .prefix(BROWSER_PROFILE_PREFIX)
            .tempdir()
            .map_err(|source| InitializationError::ResourceError {
                what: "browser profile directory".to_string(),
                source,
            })?;
        debug!("[{ID}] Using browser profile {}", dir.path().display());
        *self.profile.lock().unwrap_or_else(PoisonError::into_inner) = Some(dir);

        subscribe(&self, session, Topic::PageResponsive, ID, |agent, session, event| async move {
            if let Event::PageResponsive(url) = event {
                agent.on_page_responsive(&session, url).await;
            }
        });
        subscribe(&self, session, Topic::RunEnd, ID, |agent, _session, _event| async move {
            agent.release_profile();
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::Capture;
    use crate::config::Config;
    use async_trait::async_trait;
    use std::time::Duration;

    struct StaticCapturer {
        polluted: bool,
    }

    #[async_trait]
    impl Capturer for StaticCapturer {
        async fn capture(&self, request: CaptureRequest) -> Result<Capture> {
            assert!(request.url.contains("__proto__[foo]=polluted"));
            assert!(request.profile_dir.exists());
            Ok(Capture {
                png: vec![0x89, b'P', b'N', b'G'],
                prototype_polluted: self.polluted,
            })
        }
    }

    struct HangingCapturer;

    #[async_trait]
    impl Capturer for HangingCapturer {
        async fn capture(&self, _request: CaptureRequest) -> Result<Capture> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Capture::default())
        }
    }

    fn session(out: &std::path::Path) -> Arc<Session> {
        crate::initialization::init_output_dirs(out).unwrap();
        Session::new(Arc::new(Config {
            out_dir: out.to_path_buf(),
            screenshot_timeout: Duration::from_millis(200),
            ..Config::default()
        }))
    }

    #[tokio::test]
    async fn test_capture_is_saved_and_tagged() {
        let out = tempfile::tempdir().unwrap();
        let session = session(out.path());
        let agent = Arc::new(UrlScreenshotter::new(Arc::new(StaticCapturer { polluted: true })));
        Arc::clone(&agent).register(&session).unwrap();
        let profile = agent.profile_dir().unwrap();

        let (page, _) = session.add_page("http://example.com/").unwrap();
        session.bus().publish(Event::PageResponsive(page.url().to_string()));
        session.tasks().join_all().await;

        assert!(page.has_screenshot());
        let png = out
            .path()
            .join(SCREENSHOTS_DIR)
            .join(format!("{}.png", page.basename()));
        assert!(png.exists());
        assert_eq!(page.tags().len(), 1);
        assert_eq!(page.tags()[0].text, "Prototype Pollution");
        assert_eq!(session.stats().get(StatKind::ScreenshotsSuccessful), 1);

        session.bus().publish(Event::RunEnd);
        session.tasks().join_all().await;
        session.bus().close();
        assert!(!profile.exists(), "profile must be removed at RunEnd");
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let out = tempfile::tempdir().unwrap();
        let session = session(out.path());
        Arc::new(UrlScreenshotter::new(Arc::new(HangingCapturer)))
            .register(&session)
            .unwrap();

        let (page, _) = session.add_page("http://example.com/").unwrap();
        session.bus().publish(Event::PageResponsive(page.url().to_string()));
        session.tasks().join_all().await;
        session.bus().close();

        assert!(!page.has_screenshot());
        assert_eq!(session.stats().get(StatKind::ScreenshotsAttempted), 1);
        assert_eq!(session.stats().get(StatKind::ScreenshotsFailed), 1);
    }
}
