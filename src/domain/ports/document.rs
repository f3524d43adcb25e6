//! Document text extraction port

use crate::domain::errors::RagResult;
use async_trait::async_trait;
use std::path::Path;

/// Produces the plain text of a document on disk.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Fails with `NotFound` for a missing path and `UnsupportedFormat` for
    /// anything the extractor cannot read.
    async fn extract(&self, path: &Path) -> RagResult<String>;

    /// Whether `path` looks like something this extractor handles.
    fn supports(&self, path: &Path) -> bool;
}
