//! `reset` command handler

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;

use crate::cli::output::{output, CommandOutput};
use crate::services::RagService;

#[derive(Debug, Serialize)]
pub struct ResetOutput {
    pub removed: usize,
}

impl CommandOutput for ResetOutput {
    fn to_human(&self) -> String {
        format!(
            "Vector store has been successfully reset ({} chunk(s) removed).",
            self.removed
        )
    }

    fn to_json(&self) -> serde_json::Value {
        json!({ "reset": true, "removed": self.removed })
    }
}

/// Handle `reset`.
pub async fn handle_reset(service: &RagService, json: bool) -> Result<()> {
    let removed = service
        .stored_chunks()
        .await
        .context("Failed to count stored chunks")?;
    service
        .reset_vector_store()
        .await
        .context("Failed to reset vector store")?;

    output(&ResetOutput { removed }, json);
    Ok(())
}
