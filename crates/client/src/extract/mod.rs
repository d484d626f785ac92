//! Structural element extraction.
//!
//! Turns a page into a flat list of [`ElementDescriptor`]s. Two input modes:
//!
//! ### Live page
//! - [`EXTRACTION_SCRIPT`] runs inside the rendered page through a [`PageEvaluator`].
//! - Returned descriptors are untrusted and are re-sanitized on this side.
//!
//! ### Markup
//! - A best-effort tag scan that only finds button and input-like controls.
//! - Never fails; malformed markup yields an empty list.

pub mod markup;
pub mod script;

pub use markup::extract_from_markup;
pub use script::EXTRACTION_SCRIPT;

use sha2::{Digest, Sha256};
use sigcache_core::ElementDescriptor;
use thiserror::Error;

/// Errors from evaluating the extraction routine in a live page.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The page could not run the script.
    #[error("page evaluation failed: {0}")]
    Evaluation(String),

    /// The script ran but returned something other than a descriptor list.
    #[error("unexpected extraction payload: {0}")]
    Payload(String),
}

/// The single capability consumed from a browser driver: run a script in
/// the page and hand back its JSON result.
#[async_trait::async_trait]
pub trait PageEvaluator: Send + Sync {
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, ExtractError>;
}

/// A page as seen by the cache.
#[derive(Clone, Copy)]
pub enum PageSnapshot<'a> {
    /// A rendered page that can evaluate scripts.
    Live(&'a dyn PageEvaluator),
    /// Raw markup.
    Markup(&'a str),
}

impl PageSnapshot<'_> {
    /// Key under which the signature of this snapshot may be memoized.
    ///
    /// Live pages are identified by URL. Markup adds a digest of its content so
    /// two different documents served at one URL never share a signature.
    pub fn identity(&self, url: &str) -> String {
        match self {
            Self::Live(_) => url.to_string(),
            Self::Markup(html) => {
                let digest = hex::encode(Sha256::digest(html.as_bytes()));
                format!("{url}#{}", &digest[..16])
            }
        }
    }
}

impl std::fmt::Debug for PageSnapshot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live(_) => f.write_str("PageSnapshot::Live"),
            Self::Markup(html) => write!(f, "PageSnapshot::Markup({} bytes)", html.len()),
        }
    }
}

/// Extract element descriptors from a page.
///
/// # Errors
///
/// Only live pages fail, when evaluation itself fails or returns a payload
/// that is not a descriptor list.
pub async fn extract_elements(page: &PageSnapshot<'_>) -> Result<Vec<ElementDescriptor>, ExtractError> {
    match page {
        PageSnapshot::Markup(html) => Ok(extract_from_markup(html)),
        PageSnapshot::Live(evaluator) => {
            let value = evaluator.evaluate(EXTRACTION_SCRIPT).await?;
            let raw: Vec<ElementDescriptor> =
                serde_json::from_value(value).map_err(|e| ExtractError::Payload(e.to_string()))?;
            Ok(raw.into_iter().map(ElementDescriptor::sanitized).collect())
        }
    }
}
