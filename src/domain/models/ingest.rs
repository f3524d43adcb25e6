//! Ingestion outcomes

use serde::{Deserialize, Serialize};

/// Summary of one successful ingest call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub source: String,
    pub chunks_ingested: usize,
    pub effective_chunk_size: usize,
    pub ids: Vec<String>,
}

impl IngestReport {
    pub fn empty(source: String, effective_chunk_size: usize) -> Self {
        Self {
            source,
            chunks_ingested: 0,
            effective_chunk_size,
            ids: Vec::new(),
        }
    }
}

/// Per-item result of a batch ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Succeeded(IngestReport),
    Skipped { source: String, reason: String },
    Failed { source: String, reason: String },
}

/// Reason recorded for glob matches that are not regular files.
pub const NOT_A_FILE: &str = "not a file";

/// Aggregated result of [`ingest_many`](crate::services::RagService::ingest_many).
///
/// Both lists are in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchIngestReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<FailedIngest>,
}

/// A source that was skipped or failed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedIngest {
    pub source: String,
    pub reason: String,
    /// True when the source was never attempted (e.g. a directory match).
    #[serde(default)]
    pub skipped: bool,
}

impl BatchIngestReport {
    pub fn record(&mut self, outcome: IngestOutcome) {
        match outcome {
            IngestOutcome::Succeeded(report) => self.succeeded.push(report.source),
            IngestOutcome::Skipped { source, reason } => self.failed.push(FailedIngest {
                source,
                reason,
                skipped: true,
            }),
            IngestOutcome::Failed { source, reason } => self.failed.push(FailedIngest {
                source,
                reason,
                skipped: false,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.succeeded.is_empty() && self.failed.is_empty()
    }

    /// Human-readable summary shared by the CLI and the tool server.
    pub fn summary(&self) -> String {
        let mut message = format!(
            "Ingestion complete. Successfully ingested {} file(s).",
            self.succeeded.len()
        );
        if !self.succeeded.is_empty() {
            message.push_str("\nIngested: ");
            message.push_str(&self.succeeded.join(", "));
        }
        if !self.failed.is_empty() {
            let failed: Vec<String> = self
                .failed
                .iter()
                .map(|f| {
                    if f.skipped {
                        format!("{} (Skipped: {})", f.source, capitalize(&f.reason))
                    } else {
                        format!("{} (Error: {})", f.source, f.reason)
                    }
                })
                .collect();
            message.push_str("\nSkipped/Failed: ");
            message.push_str(&failed.join(", "));
        }
        message
    }
}

impl FromIterator<IngestOutcome> for BatchIngestReport {
    fn from_iter<T: IntoIterator<Item = IngestOutcome>>(iter: T) -> Self {
        let mut report = Self::default();
        for outcome in iter {
            report.record(outcome);
        }
        report
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
