//! cache_purge tool implementation.
//!
//! Purges expired entries, or every entry.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Remove every entry instead of only expired ones.
    #[serde(default)]
    pub all: bool,

    /// Also drop memoized page signatures.
    #[serde(default)]
    pub signatures: bool,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of entries deleted.
    pub deleted: usize,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(ctx: &AppContext, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let deleted = if params.all { ctx.store.clear().await? } else { ctx.store.purge_expired().await? };
    if params.signatures {
        ctx.store.signatures().clear();
    }
    tracing::info!(deleted, all = params.all, "cache purged");

    json_result(&CachePurgeOutput { deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{PAGE_A, URL, context, output};
    use sigcache_client::PageSnapshot;

    #[tokio::test]
    async fn test_purge_expired_keeps_fresh() {
        let ctx = context().await;
        ctx.store.set("click primary button", URL, "#primary-btn", &PageSnapshot::Markup(PAGE_A)).await.unwrap();

        let out: CachePurgeOutput = output(&purge_impl(&ctx, CachePurgeParams::default()).await.unwrap());
        assert_eq!(out.deleted, 0);
        assert_eq!(ctx.store.len(), 1);
    }

    #[tokio::test]
    async fn test_purge_all() {
        let ctx = context().await;
        ctx.store.set("click primary button", URL, "#primary-btn", &PageSnapshot::Markup(PAGE_A)).await.unwrap();
        ctx.store.import_legacy("click help", URL, "#help").await.unwrap();

        let params = CachePurgeParams { all: true, signatures: true };
        let out: CachePurgeOutput = output(&purge_impl(&ctx, params).await.unwrap());
        assert_eq!(out.deleted, 2);
        assert!(ctx.store.is_empty());
        assert!(ctx.store.signatures().is_empty());
    }
}
