//! cache_migrate tool implementation.
//!
//! Binds legacy entries of a URL to the structure of its current page.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sigcache_client::{MigrationAdapter, MigrationReport};

use crate::context::AppContext;
use crate::tools::json_result;
use crate::tools::page::PageSource;

/// Parameters for the cache_migrate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMigrateParams {
    /// URL whose legacy entries are migrated.
    pub url: String,

    /// Page markup. When absent the URL is opened in the headless browser.
    #[serde(default)]
    pub html: Option<String>,
}

/// Output from the cache_migrate tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CacheMigrateOutput {
    pub report: MigrationReport,
    pub migration_needed: bool,
}

/// Implementation of the cache_migrate tool.
pub async fn migrate_impl(ctx: &AppContext, params: CacheMigrateParams) -> Result<CallToolResult, McpError> {
    let adapter = MigrationAdapter::new(&ctx.store);
    if !adapter.is_migration_needed() {
        return json_result(&CacheMigrateOutput { report: MigrationReport::default(), migration_needed: false });
    }

    let page = PageSource::resolve(ctx, &params.url, params.html).await?;
    let report = adapter.migrate(&params.url, &page.snapshot()).await;
    page.release().await;

    json_result(&CacheMigrateOutput { report: report?, migration_needed: adapter.is_migration_needed() })
}
