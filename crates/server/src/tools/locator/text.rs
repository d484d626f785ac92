//! locator_text tool implementation.
//!
//! Reverse lookup: the intent recorded for a locator.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sigcache_core::Error;

use crate::context::AppContext;
use crate::tools::json_result;

/// Parameters for the locator_text tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LocatorTextParams {
    pub locator: String,
    pub url: String,
}

/// Output from the locator_text tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LocatorTextOutput {
    pub intent: String,
}

/// Implementation of the locator_text tool.
pub async fn text_impl(ctx: &AppContext, params: LocatorTextParams) -> Result<CallToolResult, McpError> {
    let intent = ctx
        .store
        .get_text_for(&params.locator, &params.url)
        .ok_or_else(|| Error::CacheMiss(format!("{} on {}", params.locator, params.url)))?;

    json_result(&LocatorTextOutput { intent })
}
