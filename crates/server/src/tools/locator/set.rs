//! locator_set tool implementation.
//!
//! Records the locator discovered for an intent on a page.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::tools::json_result;
use crate::tools::page::PageSource;

/// Parameters for the locator_set tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LocatorSetParams {
    /// Intent text, e.g. "click primary button".
    pub intent: String,

    /// URL of the page the locator was found on.
    pub url: String,

    /// The locator to cache.
    pub locator: String,

    /// Page markup. When absent the URL is opened in the headless browser.
    #[serde(default)]
    pub html: Option<String>,
}

/// Output from the locator_set tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LocatorSetOutput {
    /// Store key of the entry.
    pub key: String,

    /// Structural signature the entry is bound to; absent when the page gave no signal.
    pub signature: Option<String>,
}

/// Implementation of the locator_set tool.
pub async fn set_impl(ctx: &AppContext, params: LocatorSetParams) -> Result<CallToolResult, McpError> {
    let page = PageSource::resolve(ctx, &params.url, params.html).await?;
    let stored = ctx
        .store
        .set(&params.intent, &params.url, &params.locator, &page.snapshot())
        .await;
    page.release().await;
    let entry = stored?;

    let output = LocatorSetOutput { key: entry.key, signature: entry.dom_signature.map(|s| s.full_signature) };
    json_result(&output)
}
