//! Vector infrastructure components
//!
//! Text chunking, embedding models and vector storage for retrieval.

pub mod bert_model;
pub mod chunker;
pub mod hashing_model;
pub mod vector_store;

pub use bert_model::{BertEmbeddingModel, DEFAULT_MODEL_REPO};
pub use chunker::{token_windows, TextChunker, TokenChunk};
pub use hashing_model::HashingEmbeddingModel;
pub use vector_store::SqliteVectorStore;
