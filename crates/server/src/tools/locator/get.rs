//! locator_get tool implementation.
//!
//! Resolves an intent on a page through the exact, normalized and fuzzy steps.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sigcache_client::LookupResult;

use crate::context::AppContext;
use crate::tools::json_result;
use crate::tools::page::PageSource;

/// Parameters for the locator_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LocatorGetParams {
    /// Intent text to resolve.
    pub intent: String,

    /// URL of the current page.
    pub url: String,

    /// Page markup. When absent the URL is opened in the headless browser.
    #[serde(default)]
    pub html: Option<String>,
}

/// Output from the locator_get tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct LocatorGetOutput {
    pub found: bool,

    /// Present on a hit.
    pub result: Option<LookupResult>,
}

/// Implementation of the locator_get tool.
///
/// A miss is a successful call with `found: false`; the caller is expected
/// to discover the element and record it with locator_set.
pub async fn get_impl(ctx: &AppContext, params: LocatorGetParams) -> Result<CallToolResult, McpError> {
    let page = PageSource::resolve(ctx, &params.url, params.html).await?;
    let result = ctx.store.get(&params.intent, &params.url, &page.snapshot()).await;
    page.release().await;

    json_result(&LocatorGetOutput { found: result.is_some(), result })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::locator::set::{LocatorSetParams, set_impl};
    use crate::tools::testing::{PAGE_A, PAGE_B, URL, context, output};
    use serde_json::Value;

    fn params(intent: &str, html: &str) -> LocatorGetParams {
        LocatorGetParams { intent: intent.into(), url: URL.into(), html: Some(html.into()) }
    }

    async fn seed(ctx: &AppContext) {
        let set = LocatorSetParams {
            intent: "click primary button".into(),
            url: URL.into(),
            locator: "#primary-btn".into(),
            html: Some(PAGE_A.into()),
        };
        set_impl(ctx, set).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_exact() {
        let ctx = context().await;
        seed(&ctx).await;

        let out: Value = output(&get_impl(&ctx, params("click primary button", PAGE_A)).await.unwrap());
        assert_eq!(out["found"], true);
        assert_eq!(out["result"]["source"], "exact");
        assert_eq!(out["result"]["locator"], "#primary-btn");
    }

    #[tokio::test]
    async fn test_get_fuzzy_on_modified_page() {
        let ctx = context().await;
        seed(&ctx).await;

        let out: Value = output(&get_impl(&ctx, params("click primary btn", PAGE_B)).await.unwrap());
        assert_eq!(out["result"]["source"], "fuzzy");
        assert_eq!(out["result"]["locator"], "#primary-btn");
        assert_eq!(out["result"]["confidence"], 0.5);
    }

    #[tokio::test]
    async fn test_get_miss() {
        let ctx = context().await;
        seed(&ctx).await;

        let out: Value = output(&get_impl(&ctx, params("click logout", PAGE_A)).await.unwrap());
        assert_eq!(out["found"], false);
        assert!(out["result"].is_null());
    }
}
