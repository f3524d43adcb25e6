//! Embedding and retrieval domain models
//!
//! Scalar metadata maps persisted next to each vector, the records returned by
//! a similarity search and the ranked results handed back to callers.

use super::chunking::ChunkMetadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Embedding backends that can be wired into the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// Sentence-transformers BERT model run locally with candle
    #[default]
    Bert,

    /// Deterministic feature-hashing model, no download required
    Hashing,
}

impl EmbeddingBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bert => "bert",
            Self::Hashing => "hashing",
        }
    }
}

impl fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EmbeddingBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bert" => Ok(Self::Bert),
            "hashing" => Ok(Self::Hashing),
            other => Err(format!("unknown embedding backend: {other}")),
        }
    }
}

/// A scalar metadata value. The store accepts nothing nested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl MetadataValue {
    /// Render without quoting, the way it is shown to users.
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => s.clone(),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Scalar-only metadata map stored with each record.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A record returned by a similarity search, nearest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,

    /// Distance to the query vector (lower is better, 0 = identical)
    pub distance: f32,
}

/// A ranked query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// 1-based position in store order
    pub rank: usize,
    pub document: String,
    pub metadata: ChunkMetadata,
    pub distance: f32,
}

impl QueryResult {
    pub fn from_record(rank: usize, record: ScoredRecord) -> Self {
        Self {
            rank,
            metadata: ChunkMetadata::from_metadata(&record.metadata),
            document: record.document,
            distance: record.distance,
        }
    }

    /// Distance rendered with four decimals.
    pub fn formatted_distance(&self) -> String {
        format!("{:.4}", self.distance)
    }
}
