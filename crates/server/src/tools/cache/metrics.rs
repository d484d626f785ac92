//! cache_metrics tool implementation.
//!
//! Read-only snapshot of store counters and signature coverage.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::Serialize;
use sigcache_client::MetricsSnapshot;

use crate::context::AppContext;
use crate::tools::json_result;

/// Output from the cache_metrics tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CacheMetricsOutput {
    pub store: MetricsSnapshot,
    /// Memoized page signatures.
    pub signatures: usize,
    pub migration_needed: bool,
    /// Entries are written to SQLite.
    pub persistent: bool,
    pub selector_ttl_ms: u64,
}

/// Implementation of the cache_metrics tool.
pub fn metrics_impl(ctx: &AppContext) -> Result<CallToolResult, McpError> {
    let output = CacheMetricsOutput {
        store: ctx.store.metrics(),
        signatures: ctx.store.signatures().len(),
        migration_needed: ctx.store.legacy_count() > 0,
        persistent: ctx.config.persist,
        selector_ttl_ms: ctx.config.selector_ttl_ms,
    };
    json_result(&output)
}
