use super::embedding::EmbeddingBackend;
use super::chunking::DEFAULT_CHUNK_OVERLAP;
use serde::{Deserialize, Serialize};

/// Main configuration structure for rag-mcp
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Vector store location and collection
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Embedding model selection
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chunking defaults
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Vector store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Directory holding the store files
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Collection that ingests and queries operate on
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    "rag_db".to_string()
}

fn default_collection() -> String {
    "rag_collection".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            collection: default_collection(),
            max_connections: default_max_connections(),
        }
    }
}

/// Embedding model configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub backend: EmbeddingBackend,

    /// HuggingFace repository of the BERT model
    #[serde(default = "default_model")]
    pub model: String,

    /// Overrides the model's own input limit when set
    #[serde(default)]
    pub max_input_tokens: Option<usize>,

    /// Vector width of the hashing backend
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

fn default_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

const fn default_dimensions() -> usize {
    384
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model: default_model(),
            max_input_tokens: None,
            dimensions: default_dimensions(),
        }
    }
}

/// Chunking configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChunkingConfig {
    /// Overlap used when a caller does not pass one
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// tiktoken encoding used to count chunk tokens
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

const fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

fn default_encoding() -> String {
    "cl100k_base".to_string()
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_overlap: default_chunk_overlap(),
            encoding: default_encoding(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for daily-rotated JSON log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
