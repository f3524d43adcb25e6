//! Domain layer for the RAG pipeline
//!
//! Core models, errors and the ports adapters plug into.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{RagError, RagResult};
