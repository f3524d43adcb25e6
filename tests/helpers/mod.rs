//! Shared fixtures for integration tests
//!
//! Every service built here uses the offline hashing embedder and a store
//! inside a temporary directory, so tests need no network and never share
//! state.

#![allow(dead_code)]

use rag_mcp::domain::models::{Config, EmbeddingBackend};
use rag_mcp::infrastructure::setup::build_rag_service;
use rag_mcp::RagService;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Model input limit used by [`test_config`].
pub const TEST_MAX_INPUT_TOKENS: usize = 256;

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Config with the hashing backend and a store under `dir`.
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.database.path = dir.join("rag_db").display().to_string();
    config.embedding.backend = EmbeddingBackend::Hashing;
    config.embedding.dimensions = 256;
    config.embedding.max_input_tokens = Some(TEST_MAX_INPUT_TOKENS);
    config
}

/// A fresh service whose store lives in `dir`.
pub async fn test_service(dir: &Path) -> RagService {
    build_rag_service(&test_config(dir))
        .await
        .expect("Failed to build test service")
}

/// Write `contents` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("Failed to write fixture");
    path
}

/// Initialize tracing output captured by the test harness.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
