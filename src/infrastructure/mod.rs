//! Infrastructure layer module
//!
//! Adapters and external integrations that satisfy the domain ports:
//! - Text chunking, embedding models and the SQLite vector store
//! - Document text extraction
//! - Configuration management
//! - Logging infrastructure
//! - Service wiring

pub mod config;
pub mod documents;
pub mod logging;
pub mod setup;
pub mod vector;
