//! pagelens server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use pagelens_client::{ChatClient, HttpChatClient};
use pagelens_core::AppConfig;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    tracing::info!(storage = ?config.storage, db_path = %config.db_path.display(), "starting pagelens server on stdio transport");

    let (history, errors) = config.open_stores().await.context("failed to open storage")?;

    let client = match &config.ai {
        Some(ai) => {
            let client = HttpChatClient::new(ai).context("invalid AI configuration")?;
            tracing::info!(provider = ?ai.provider, model = client.model(), "AI provider configured");
            Some(Arc::new(client) as Arc<dyn ChatClient>)
        }
        None => {
            tracing::warn!("no AI provider configured; AI-backed tools are unavailable");
            None
        }
    };

    let handler = handler::PagelensServer::new(history, errors, client);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
