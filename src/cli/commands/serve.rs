//! `serve` command handler
//!
//! Thin adapter over the MCP stdio server. Nothing else may write to stdout
//! while it runs.

use anyhow::Result;
use std::sync::Arc;

use crate::adapters::mcp::StdioServer;
use crate::services::RagService;

/// Handle `serve`: block until stdin closes.
pub async fn handle_serve(service: Arc<RagService>) -> Result<()> {
    StdioServer::new(service).run().await
}
