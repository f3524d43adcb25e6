//! `query` command handler

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::fmt::Write as _;

use crate::cli::output::{output, CommandOutput};
use crate::cli::types::QueryArgs;
use crate::domain::models::QueryResult;
use crate::services::RagService;

#[derive(Debug, Serialize)]
pub struct QueryOutput {
    pub query: String,
    pub results: Vec<QueryResult>,
}

impl CommandOutput for QueryOutput {
    fn to_human(&self) -> String {
        if self.results.is_empty() {
            return "No results found for your query.".to_string();
        }

        let mut out = format!(
            "Found {} result(s) for \"{}\":\n",
            self.results.len(),
            self.query
        );
        for result in &self.results {
            let meta = &result.metadata;
            let _ = writeln!(out, "\n{}. Source: {} (chunk {})", result.rank, meta.source, meta.chunk_index);
            let _ = writeln!(out, "   Timestamp: {}", meta.timestamp);
            if !meta.tags.is_empty() {
                let _ = writeln!(out, "   Tags: {}", meta.tags.join(", "));
            }
            let _ = writeln!(out, "   Distance: {}", result.formatted_distance());
            let _ = writeln!(out, "   {}", result.document.replace('\n', "\n   "));
        }
        out.trim_end().to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        json!(self.results)
    }
}

/// Handle `query`.
pub async fn handle_query(service: &RagService, args: QueryArgs, json: bool) -> Result<()> {
    let results = service
        .query(&args.text, args.num_results)
        .await
        .context("Failed to perform query")?;

    output(
        &QueryOutput {
            query: args.text,
            results,
        },
        json,
    );
    Ok(())
}
