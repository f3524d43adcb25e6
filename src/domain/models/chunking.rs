//! Ingestion domain models
//!
//! What gets ingested ([`Source`]), how it is split ([`IngestOptions`]) and the
//! metadata attached to every stored chunk ([`ChunkMetadata`]).

use super::embedding::{Metadata, MetadataValue};
use crate::domain::errors::{RagError, RagResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default token overlap between consecutive chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Source name used for literal text ingested without an explicit name.
pub const STRING_INPUT_SOURCE: &str = "string_input";

/// Separator used when tags are flattened into scalar store metadata.
pub const TAG_SEPARATOR: char = ',';

/// Metadata keys written to the vector store.
pub mod keys {
    pub const SOURCE: &str = "source";
    pub const CHUNK_INDEX: &str = "chunk_index";
    pub const TIMESTAMP: &str = "timestamp";
    pub const TAGS: &str = "tags";
}

/// Something that can be ingested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A plain-text file on disk.
    File(PathBuf),
    /// Literal text, optionally named.
    Literal { text: String, name: Option<String> },
}

impl Source {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal {
            text: text.into(),
            name: None,
        }
    }

    pub fn named_literal(text: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Literal {
            text: text.into(),
            name: Some(name.into()),
        }
    }

    /// Resolve the name recorded as `source` on every chunk.
    ///
    /// An explicit override wins, then the literal's own name, then the file
    /// path, then [`STRING_INPUT_SOURCE`].
    pub fn resolve_name(&self, explicit: Option<&str>) -> String {
        if let Some(name) = explicit {
            return name.to_string();
        }
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Literal {
                name: Some(name), ..
            } => name.clone(),
            Self::Literal { name: None, .. } => STRING_INPUT_SOURCE.to_string(),
        }
    }
}

/// Per-call ingestion options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Requested chunk size in tokens; `None` uses the model limit.
    #[serde(default)]
    pub chunk_size: Option<usize>,

    /// Tokens shared between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Overrides the resolved source name.
    #[serde(default)]
    pub source_name: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,
}

const fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            chunk_size: None,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            source_name: None,
            tags: Vec::new(),
        }
    }
}

impl IngestOptions {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    pub fn with_chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.chunk_overlap = chunk_overlap;
        self
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Trim tags, drop blank ones and reject tags that cannot survive the
/// comma-joined storage form.
pub fn normalize_tags(tags: &[String]) -> RagResult<Vec<String>> {
    let mut normalized = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if tag.contains(TAG_SEPARATOR) {
            return Err(RagError::InvalidArgument(format!(
                "tag '{tag}' must not contain '{TAG_SEPARATOR}'"
            )));
        }
        normalized.push(tag.to_string());
    }
    Ok(normalized)
}

/// Metadata attached to one stored chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,

    /// Position of the chunk within its source (0-based, contiguous).
    pub chunk_index: usize,

    /// RFC 3339 timestamp shared by every chunk of one ingest call.
    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl ChunkMetadata {
    /// Flatten into the scalar map persisted by the store.
    ///
    /// Tags are joined with [`TAG_SEPARATOR`]; no `tags` key is written when
    /// there are none.
    pub fn to_metadata(&self) -> Metadata {
        let mut map = Metadata::new();
        map.insert(keys::SOURCE.into(), MetadataValue::from(self.source.as_str()));
        map.insert(
            keys::CHUNK_INDEX.into(),
            MetadataValue::Int(i64::try_from(self.chunk_index).unwrap_or(i64::MAX)),
        );
        map.insert(
            keys::TIMESTAMP.into(),
            MetadataValue::from(self.timestamp.as_str()),
        );
        if !self.tags.is_empty() {
            let joined = self.tags.join(&TAG_SEPARATOR.to_string());
            map.insert(keys::TAGS.into(), MetadataValue::String(joined));
        }
        map
    }

    /// Rebuild from a stored scalar map. Missing keys fall back to empty values.
    pub fn from_metadata(map: &Metadata) -> Self {
        let text = |key: &str| {
            map.get(key)
                .map(MetadataValue::to_display_string)
                .unwrap_or_default()
        };

        let chunk_index = match map.get(keys::CHUNK_INDEX) {
            Some(MetadataValue::Int(i)) => usize::try_from(*i).unwrap_or_default(),
            Some(MetadataValue::String(s)) => s.parse().unwrap_or_default(),
            _ => 0,
        };

        let tags = text(keys::TAGS)
            .split(TAG_SEPARATOR)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();

        Self {
            source: text(keys::SOURCE),
            chunk_index,
            timestamp: text(keys::TIMESTAMP),
            tags,
        }
    }
}
