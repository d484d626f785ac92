//! Headless browser pages for live extraction.
//!
//! This module provides a feature-gated renderer trait and implementation
//! using chromiumoxide for headless Chrome/Chromium browser control. A
//! rendered page implements [`PageEvaluator`], so it can be passed to the
//! signature cache as [`PageSnapshot::Live`](crate::extract::PageSnapshot::Live).

use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::extract::{ExtractError, PageEvaluator};

/// Errors that can occur while opening a page.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Failed to launch or connect to browser.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Failed to navigate to URL.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Timeout waiting for page to load.
    #[error("render timeout after {0}ms")]
    Timeout(u64),

    /// Wait selector not found.
    #[error("wait_for selector not found: {0}")]
    SelectorNotFound(String),
}

impl From<RenderError> for sigcache_core::Error {
    fn from(err: RenderError) -> Self {
        sigcache_core::Error::RenderFailed(err.to_string())
    }
}

/// Options for rendering a page.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Timeout in milliseconds (default: 30000).
    pub timeout_ms: u64,

    /// Optional CSS selector to wait for before extraction.
    pub wait_for: Option<String>,

    /// Settle time when no selector is given (default: 2000).
    pub settle_ms: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { timeout_ms: 30000, wait_for: None, settle_ms: 2000 }
    }
}

/// A page open in the headless browser.
pub struct RenderedPage {
    page: chromiumoxide::Page,

    /// Final URL after redirects.
    pub final_url: Url,

    /// Time taken to load in milliseconds.
    pub render_time_ms: u64,
}

impl RenderedPage {
    /// Close the browser tab.
    pub async fn close(self) {
        if let Err(e) = self.page.close().await {
            tracing::debug!("page close failed: {e}");
        }
    }
}

#[async_trait::async_trait]
impl PageEvaluator for RenderedPage {
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, ExtractError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ExtractError::Evaluation(e.to_string()))?;
        result
            .into_value::<serde_json::Value>()
            .map_err(|e| ExtractError::Payload(e.to_string()))
    }
}

/// Renderer trait for opening live pages.
#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    /// Open `url` and wait until it is ready for extraction.
    async fn open(&self, url: &Url, opts: &RenderOptions) -> Result<RenderedPage, RenderError>;
}

/// Headless Chrome/Chromium renderer using chromiumoxide.
pub struct HeadlessRenderer {
    browser: chromiumoxide::Browser,
}

impl HeadlessRenderer {
    /// Create a new headless renderer by launching a browser instance.
    ///
    /// The browser runs in headless mode and uses a background task
    /// to handle Chrome DevTools Protocol events.
    pub async fn new() -> Result<Self, RenderError> {
        use chromiumoxide::browser::{Browser, BrowserConfig};
        use futures_util::StreamExt;

        let (browser, mut handler) = Browser::launch(BrowserConfig::builder().build().map_err(RenderError::BrowserLaunch)?)
            .await
            .map_err(|e| RenderError::BrowserLaunch(e.to_string()))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                    break;
                }
            }
        });

        tracing::info!("headless browser launched");
        Ok(Self { browser })
    }
}

#[async_trait::async_trait]
impl Renderer for HeadlessRenderer {
    async fn open(&self, url: &Url, opts: &RenderOptions) -> Result<RenderedPage, RenderError> {
        let start = std::time::Instant::now();
        let page = self
            .browser
            .new_page(url.as_str())
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        let ready = match &opts.wait_for {
            Some(selector) => {
                let wait_result = tokio::time::timeout(Duration::from_millis(opts.timeout_ms), async {
                    for _ in 0..30 {
                        if page.find_element(selector.as_str()).await.is_ok() {
                            return Ok(());
                        }
                        tokio::time::sleep(Duration::from_millis(500)).await;
                    }
                    Err(RenderError::SelectorNotFound(selector.clone()))
                })
                .await;
                wait_result.unwrap_or(Err(RenderError::Timeout(opts.timeout_ms)))
            }
            None => tokio::time::timeout(
                Duration::from_millis(opts.timeout_ms),
                tokio::time::sleep(Duration::from_millis(opts.settle_ms)),
            )
            .await
            .map_err(|_| RenderError::Timeout(opts.timeout_ms)),
        };

        if let Err(e) = ready {
            page.close().await.ok();
            return Err(e);
        }

        let page_url = page.url().await.map_err(|e| RenderError::Navigation(e.to_string()))?;
        let final_url =
            Url::parse(page_url.as_deref().unwrap_or(url.as_str())).map_err(|e| RenderError::Navigation(e.to_string()))?;

        let render_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(url = %final_url, render_time_ms, "page opened");
        Ok(RenderedPage { page, final_url, render_time_ms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{PageSnapshot, extract_elements};

    #[test]
    fn test_render_error_maps_to_core_error() {
        let err: sigcache_core::Error = RenderError::Timeout(5).into();
        assert!(err.to_string().contains("render timeout after 5ms"));
    }

    #[tokio::test]
    #[ignore = "requires Chrome/Chromium installation"]
    async fn test_headless_renderer_new() {
        let renderer = HeadlessRenderer::new().await;
        assert!(renderer.is_ok());
    }

    #[tokio::test]
    #[ignore = "requires network and Chrome/Chromium"]
    async fn test_live_extraction() {
        let renderer = HeadlessRenderer::new().await.unwrap();
        let url = Url::parse("https://example.com").unwrap();

        let page = renderer.open(&url, &RenderOptions::default()).await.unwrap();
        assert_eq!(page.final_url.as_str(), "https://example.com/");

        let elements = extract_elements(&PageSnapshot::Live(&page)).await.unwrap();
        assert!(elements.iter().any(|e| e.tag == "h1"));
        page.close().await;
    }
}
