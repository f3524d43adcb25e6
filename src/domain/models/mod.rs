pub mod chunking;
pub mod config;
pub mod embedding;
pub mod ingest;

pub use chunking::{
    normalize_tags, ChunkMetadata, IngestOptions, Source, DEFAULT_CHUNK_OVERLAP,
    STRING_INPUT_SOURCE,
};
pub use config::{ChunkingConfig, Config, DatabaseConfig, EmbeddingConfig, LoggingConfig};
pub use embedding::{EmbeddingBackend, Metadata, MetadataValue, QueryResult, ScoredRecord};
pub use ingest::{BatchIngestReport, FailedIngest, IngestOutcome, IngestReport, NOT_A_FILE};
