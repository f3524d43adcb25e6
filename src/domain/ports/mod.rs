//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that infrastructure adapters implement:
//! - EmbeddingModel: text to vectors
//! - VectorStore: persistence and similarity search
//! - TextExtractor: document to plain text
//!
//! The orchestrator only sees these traits, so any adapter can be swapped in.

pub mod document;
pub mod embedding;
pub mod vector_store;

pub use document::TextExtractor;
pub use embedding::EmbeddingModel;
pub use vector_store::VectorStore;
