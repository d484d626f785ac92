//! MCP tool implementations.
//!
//! This module contains all tools exposed by the sigcache server.

pub mod cache;
pub mod locator;
pub mod page;
pub mod signature;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use sigcache_core::Error;

/// Pretty JSON text result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::Serialization(format!("failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::context::AppContext;
    use rmcp::model::CallToolResult;
    use sigcache_core::AppConfig;

    pub const URL: &str = "https://app.test/checkout";
    pub const PAGE_A: &str = r#"<main><button id="primary-btn" class="btn btn-primary">Submit</button></main>"#;
    pub const PAGE_B: &str = r#"<main><button id="primary-btn" class="btn btn-primary">Submit</button>
        <button id="help">Help</button></main>"#;

    /// In-memory context with rendering off.
    pub async fn context() -> AppContext {
        AppContext::from_config(AppConfig::default()).await.unwrap()
    }

    /// Parse the text content of a tool result.
    pub fn output<T: serde::de::DeserializeOwned>(result: &CallToolResult) -> T {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
