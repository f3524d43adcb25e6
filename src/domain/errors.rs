//! Domain errors for the RAG pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the chunker, the collaborators and the orchestrator.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported file type for {}: {reason}", path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(
        "Length mismatch: {documents} documents, {embeddings} embeddings, {metadatas} metadatas{}",
        format_ids(.ids)
    )]
    LengthMismatch {
        documents: usize,
        embeddings: usize,
        metadatas: usize,
        ids: Option<usize>,
    },

    #[error("Collaborator failure: {0}")]
    Collaborator(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_ids(ids: &Option<usize>) -> String {
    ids.map(|n| format!(", {n} ids")).unwrap_or_default()
}

pub type RagResult<T> = Result<T, RagError>;

impl RagError {
    /// Wrap any displayable collaborator error.
    pub fn collaborator(err: impl std::fmt::Display) -> Self {
        Self::Collaborator(err.to_string())
    }
}

impl From<sqlx::Error> for RagError {
    fn from(err: sqlx::Error) -> Self {
        Self::Collaborator(format!("database: {err}"))
    }
}

impl From<serde_json::Error> for RagError {
    fn from(err: serde_json::Error) -> Self {
        Self::Collaborator(format!("serialization: {err}"))
    }
}

impl From<tokio::task::JoinError> for RagError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Collaborator(format!("worker task failed: {err}"))
    }
}
