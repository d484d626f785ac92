//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.

use std::sync::Arc;

use crate::context::AppContext;
use crate::tools::cache::{CacheMigrateParams, CachePurgeParams, metrics_impl, migrate_impl, purge_impl};
use crate::tools::locator::{LocatorGetParams, LocatorSetParams, LocatorTextParams, get_impl, set_impl, text_impl};
use crate::tools::signature::{SignatureComputeParams, compute_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for sigcache.
#[derive(Clone)]
pub struct SigcacheServer {
    ctx: Arc<AppContext>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SigcacheServer {
    /// Create a new server handler.
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx, tool_router: Self::tool_router() }
    }

    #[tool(description = "Cache the locator discovered for an intent on a page. \
        Pass the page markup as html, or omit it to open the url in the headless browser when enabled.")]
    async fn locator_set(&self, params: Parameters<LocatorSetParams>) -> Result<CallToolResult, McpError> {
        set_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Resolve an intent to a cached locator. Tries an exact key, then the normalized intent, \
        then structurally similar pages. Returns found=false on a miss.")]
    async fn locator_get(&self, params: Parameters<LocatorGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Return the intent recorded for a locator on a url.")]
    async fn locator_text(&self, params: Parameters<LocatorTextParams>) -> Result<CallToolResult, McpError> {
        text_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Hit/miss counters by lookup source, entry count and signature coverage.")]
    async fn cache_metrics(&self) -> Result<CallToolResult, McpError> {
        metrics_impl(&self.ctx)
    }

    #[tool(description = "Remove expired entries, or every entry with all=true.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Re-key legacy entries of a url under the signature of its current page.")]
    async fn cache_migrate(&self, params: Parameters<CacheMigrateParams>) -> Result<CallToolResult, McpError> {
        migrate_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Compute the three-tier structural signature of a page, optionally scoring it \
        against another critical:important:context hex signature.")]
    async fn signature_compute(&self, params: Parameters<SignatureComputeParams>) -> Result<CallToolResult, McpError> {
        compute_impl(&self.ctx, params.0).await
    }
}

impl ServerHandler for SigcacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "sigcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
