//! `ingest-file` and `ingest-text` command handlers

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::json;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::cli::types::{ChunkingArgs, IngestFileArgs, IngestTextArgs};
use crate::domain::models::{BatchIngestReport, IngestOptions, IngestReport, Source};
use crate::services::{has_glob_meta, RagService};

impl ChunkingArgs {
    fn to_options(&self, default_overlap: usize) -> IngestOptions {
        IngestOptions {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap.unwrap_or(default_overlap),
            source_name: None,
            tags: self.tags.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchIngestOutput {
    pub report: BatchIngestReport,
}

impl CommandOutput for BatchIngestOutput {
    fn to_human(&self) -> String {
        if self.report.is_empty() {
            return "No files matched.".to_string();
        }
        format!(
            "{}\n{}",
            TableFormatter::new().format_batch_report(&self.report),
            self.report.summary()
        )
    }

    fn to_json(&self) -> serde_json::Value {
        json!({
            "succeeded": self.report.succeeded,
            "failed": self.report.failed,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct IngestOutput {
    pub report: IngestReport,
}

impl CommandOutput for IngestOutput {
    fn to_human(&self) -> String {
        let report = &self.report;
        if report.chunks_ingested == 0 {
            return format!("No text content to ingest from {}.", report.source);
        }
        format!(
            "Ingested {} chunk(s) from {} (chunk size {}).",
            report.chunks_ingested, report.source, report.effective_chunk_size
        )
    }

    fn to_json(&self) -> serde_json::Value {
        json!(self.report)
    }
}

/// Handle `ingest-file`.
///
/// A single plain path with `--source-name` is ingested on its own and any
/// error is fatal. Everything else goes through batch ingestion, which exits
/// non-zero only when no file at all was ingested.
pub async fn handle_ingest_file(
    service: &RagService,
    args: IngestFileArgs,
    default_overlap: usize,
    json: bool,
) -> Result<()> {
    let options = args.chunking.to_options(default_overlap);

    if let (Some(source_name), [path]) = (&args.source_name, args.paths.as_slice()) {
        if !has_glob_meta(path) {
            let options = options.with_source_name(source_name.clone());
            let report = service
                .ingest(Source::file(path), &options)
                .await
                .with_context(|| format!("Failed to ingest {path}"))?;
            output(&IngestOutput { report }, json);
            return Ok(());
        }
    }

    if args.source_name.is_some() {
        tracing::warn!("--source-name is ignored when ingesting more than one file");
    }

    let report = service.ingest_many(&args.paths, &options).await;
    let nothing_ingested = report.succeeded.is_empty();
    output(&BatchIngestOutput { report }, json);

    if nothing_ingested {
        bail!("No files were ingested");
    }
    Ok(())
}

/// Handle `ingest-text`.
pub async fn handle_ingest_text(
    service: &RagService,
    args: IngestTextArgs,
    default_overlap: usize,
    json: bool,
) -> Result<()> {
    let mut options = args.chunking.to_options(default_overlap);
    options.source_name = args.source_name;

    let report = service
        .ingest(Source::literal(args.text), &options)
        .await
        .context("Failed to ingest text")?;

    output(&IngestOutput { report }, json);
    Ok(())
}
