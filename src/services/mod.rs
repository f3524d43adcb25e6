pub mod rag_service;

pub use rag_service::{has_glob_meta, resolve_chunk_size, RagService, DEFAULT_NUM_RESULTS};
