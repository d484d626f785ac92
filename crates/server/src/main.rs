//! sigcache MCP server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use sigcache_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod context;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!(
        persist = config.persist,
        render = config.render_enabled,
        selector_ttl_ms = config.selector_ttl_ms,
        "Starting sigcache server on stdio transport"
    );

    let ctx = Arc::new(context::AppContext::from_config(config).await?);
    let handler = handler::SigcacheServer::new(Arc::clone(&ctx));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    ctx.shutdown();

    Ok(())
}
