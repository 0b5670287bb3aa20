//! Headless browser seam.
//!
//! [`PageRenderer`] is the only boundary to the browser engine: it turns a URL
//! into rendered DOM HTML. [`ChromeRenderer`] is the production
//! implementation; tests substitute their own.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use uuid::Uuid;

use crate::error::ScraperError;

/// Produces the rendered HTML of a page.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String, ScraperError>;
}

/// Launch settings for [`ChromeRenderer`].
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Bound on navigation plus content capture.
    pub timeout: Duration,
    pub user_agent: String,
    /// Explicit Chrome/Chromium binary; auto-detected when `None`.
    pub executable: Option<PathBuf>,
    pub headless: bool,
}

/// Renders pages in a fresh headless Chrome per call.
///
/// Each [`render`](PageRenderer::render) launches its own browser with a
/// throwaway profile directory and closes it before returning, whether the
/// load succeeded, failed, or timed out. Browsers are never shared between
/// calls.
#[derive(Debug)]
pub struct ChromeRenderer {
    options: BrowserOptions,
}

impl ChromeRenderer {
    /// Validates that a browser can be configured on this host.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::BrowserUnavailable`] when no Chrome executable
    /// can be found or the launch configuration is rejected.
    pub fn new(options: BrowserOptions) -> Result<Self, ScraperError> {
        let renderer = Self { options };
        let probe_dir = std::env::temp_dir().join("salonscope-probe");
        renderer
            .browser_config(&probe_dir)
            .map_err(ScraperError::BrowserUnavailable)?;
        Ok(renderer)
    }

    fn browser_config(&self, profile_dir: &Path) -> Result<BrowserConfig, String> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .user_data_dir(profile_dir)
            .request_timeout(self.options.timeout);

        if let Some(path) = &self.options.executable {
            builder = builder.chrome_executable(path);
        }
        if !self.options.headless {
            builder = builder.with_head();
        }

        builder.build()
    }

    async fn load(&self, browser: &Browser, url: &str) -> Result<String, ScraperError> {
        let navigation = |e: chromiumoxide::error::CdpError| ScraperError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let page = browser.new_page("about:blank").await.map_err(navigation)?;
        page.set_user_agent(self.options.user_agent.as_str())
            .await
            .map_err(navigation)?;
        page.goto(url)
            .await
            .map_err(navigation)?
            .wait_for_navigation()
            .await
            .map_err(navigation)?;

        page.content().await.map_err(|e| ScraperError::Content {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn render(&self, url: &str) -> Result<String, ScraperError> {
        let profile_dir = std::env::temp_dir().join(format!("salonscope-{}", Uuid::new_v4()));
        let config = self
            .browser_config(&profile_dir)
            .map_err(ScraperError::BrowserUnavailable)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScraperError::Launch(e.to_string()))?;

        let events = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        let outcome = tokio::time::timeout(self.options.timeout, self.load(&browser, url))
            .await
            .unwrap_or_else(|_| {
                Err(ScraperError::Timeout {
                    url: url.to_string(),
                    secs: self.options.timeout.as_secs(),
                })
            });

        if let Err(e) = browser.close().await {
            tracing::warn!(url, error = %e, "browser: close failed");
        }
        if let Err(e) = browser.wait().await {
            tracing::warn!(url, error = %e, "browser: wait for exit failed");
        }
        events.abort();

        if let Err(e) = tokio::fs::remove_dir_all(&profile_dir).await {
            tracing::debug!(
                path = %profile_dir.display(),
                error = %e,
                "browser: profile cleanup skipped"
            );
        }

        outcome
    }
}
