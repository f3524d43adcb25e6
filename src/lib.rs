//! rag-mcp - Minimal retrieval-augmented generation utility
//!
//! Ingests plain text, splits it into overlapping token windows, embeds each
//! window and stores it in a SQLite-backed vector store. Stored chunks are
//! retrieved by embedding similarity, from the CLI or as MCP tools.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, errors and ports
//! - **Service Layer** (`services`): The ingest/query orchestrator
//! - **Infrastructure Layer** (`infrastructure`): Chunker, embedding models,
//!   vector store, config and logging
//! - **Adapters** (`adapters`): SQLite plumbing and the MCP stdio server
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use rag_mcp::domain::models::{Config, IngestOptions, Source};
//! use rag_mcp::infrastructure::setup::build_rag_service;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = build_rag_service(&Config::default()).await?;
//!     service.ingest(Source::literal("Rust has no garbage collector."), &IngestOptions::default()).await?;
//!     for hit in service.query("garbage collection", 3).await? {
//!         println!("{} {}", hit.formatted_distance(), hit.document);
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    BatchIngestReport, ChunkMetadata, Config, IngestOptions, IngestReport, QueryResult, Source,
};
pub use domain::ports::{EmbeddingModel, TextExtractor, VectorStore};
pub use domain::{RagError, RagResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::setup::build_rag_service;
pub use services::RagService;
