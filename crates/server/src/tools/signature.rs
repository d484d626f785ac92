//! signature_compute tool implementation.
//!
//! Computes the structural signature of a page without touching the store,
//! optionally scoring it against another signature string.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sigcache_client::extract_elements;
use sigcache_core::signature::{ElementCounts, is_valid_signature, parse_signature};
use sigcache_core::{Error, Signature};

use crate::context::AppContext;
use crate::tools::json_result;
use crate::tools::page::PageSource;

/// Parameters for the signature_compute tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SignatureComputeParams {
    /// URL of the page.
    pub url: String,

    /// Page markup. When absent the URL is opened in the headless browser.
    #[serde(default)]
    pub html: Option<String>,

    /// A `critical:important:context` hex signature to score against.
    #[serde(default)]
    pub compare_to: Option<String>,
}

/// Output from the signature_compute tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SignatureComputeOutput {
    pub signature: String,
    pub element_counts: ElementCounts,
    /// Elements extracted before tier assignment.
    pub elements: usize,
    /// Whether the signature follows the strict hex grammar (no empty tiers).
    pub valid: bool,
    /// Tier-weighted score against `compare_to`.
    pub score: Option<f64>,
}

/// Implementation of the signature_compute tool.
pub async fn compute_impl(ctx: &AppContext, params: SignatureComputeParams) -> Result<CallToolResult, McpError> {
    let other = params
        .compare_to
        .as_deref()
        .map(|value| {
            parse_signature(value)
                .map(|p| Signature::new(p.critical, p.important, p.context, ElementCounts::default()))
                .ok_or_else(|| Error::InvalidSignature(value.to_string()))
        })
        .transpose()?;

    let page = PageSource::resolve(ctx, &params.url, params.html).await?;
    let extracted = extract_elements(&page.snapshot()).await;
    page.release().await;
    let elements = extracted.map_err(|e| Error::ExtractFailed(e.to_string()))?;

    let signature = ctx.store.signatures().builder().build(&elements);
    let score = other.map(|o| ctx.store.engine().score(&signature, &o));

    let output = SignatureComputeOutput {
        valid: is_valid_signature(&signature.full_signature),
        signature: signature.full_signature,
        element_counts: signature.element_counts,
        elements: elements.len(),
        score,
    };
    json_result(&output)
}
