//! Page input shared by the tools.
//!
//! A tool receives either markup inline or, with rendering enabled, only a
//! URL that is opened in the headless browser.

use sigcache_client::PageSnapshot;
use sigcache_core::Error;

use crate::context::AppContext;

#[cfg(feature = "render")]
use sigcache_client::render::{RenderOptions, RenderedPage, Renderer};

/// A page held for the duration of one tool call.
pub enum PageSource {
    Markup(String),
    #[cfg(feature = "render")]
    Live(RenderedPage),
}

impl PageSource {
    /// Use `html` when given, otherwise open `url` live.
    ///
    /// # Errors
    ///
    /// `RenderDisabled` without markup when rendering is off; `RenderFailed`
    /// when the page cannot be opened.
    pub async fn resolve(ctx: &AppContext, url: &str, html: Option<String>) -> Result<Self, Error> {
        if let Some(html) = html {
            return Ok(Self::Markup(html));
        }
        Self::open(ctx, url).await
    }

    #[cfg(feature = "render")]
    async fn open(ctx: &AppContext, url: &str) -> Result<Self, Error> {
        let Some(renderer) = &ctx.renderer else {
            return Err(Error::RenderDisabled);
        };
        let parsed = url::Url::parse(url).map_err(|e| Error::InvalidInput(format!("invalid url {url}: {e}")))?;
        let page = renderer.open(&parsed, &RenderOptions::default()).await?;
        Ok(Self::Live(page))
    }

    #[cfg(not(feature = "render"))]
    async fn open(_ctx: &AppContext, _url: &str) -> Result<Self, Error> {
        Err(Error::RenderDisabled)
    }

    pub fn snapshot(&self) -> PageSnapshot<'_> {
        match self {
            Self::Markup(html) => PageSnapshot::Markup(html),
            #[cfg(feature = "render")]
            Self::Live(page) => PageSnapshot::Live(page),
        }
    }

    /// Close a live page; markup needs nothing.
    pub async fn release(self) {
        #[cfg(feature = "render")]
        if let Self::Live(page) = self {
            page.close().await;
        }
    }
}
