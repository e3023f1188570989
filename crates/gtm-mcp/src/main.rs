//! Google Tag Manager MCP Server
//!
//! Usage:
//!   gtm-mcp
//!
//! The server communicates over stdio using JSON-RPC 2.0. Verbosity comes
//! from `RUST_LOG`, or `LOG_LEVEL` / `DEBUG=true` when `RUST_LOG` is unset.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use gtm_core::{Config, GtmContext};
use gtm_mcp::McpServer;

fn env_filter() -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let debug = matches!(std::env::var("DEBUG").as_deref(), Ok("true") | Ok("1"));
    let level = if debug {
        "debug".to_string()
    } else {
        std::env::var("LOG_LEVEL")
            .map(|l| l.to_lowercase())
            .ok()
            .filter(|l| matches!(l.as_str(), "debug" | "info" | "warn" | "error"))
            .unwrap_or_else(|| "info".to_string())
    };
    EnvFilter::new(level)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging to stderr (stdout is for MCP protocol)
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Google Tag Manager MCP server");

    let config = Config::load().context("Failed to load configuration")?;
    let ctx = GtmContext::from_config(config).context("Failed to initialize Tag Manager client")?;

    let mut server = McpServer::new(Arc::new(ctx));
    server.run().await?;

    Ok(())
}
