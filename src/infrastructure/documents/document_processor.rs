//! Plain-text document extraction.

use crate::domain::errors::{RagError, RagResult};
use crate::domain::ports::TextExtractor;
use async_trait::async_trait;
use std::path::Path;

/// Extensions accepted by [`DocumentProcessor`], compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt"];

/// Reads `.txt` files as UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentProcessor;

impl DocumentProcessor {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for DocumentProcessor {
    async fn extract(&self, path: &Path) -> RagResult<String> {
        if !tokio::fs::try_exists(path).await? {
            return Err(RagError::NotFound(path.to_path_buf()));
        }

        if !self.supports(path) {
            let extension = path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_else(|| "(none)".to_string());
            return Err(RagError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: format!("extension {extension} is not one of .txt"),
            });
        }

        let bytes = tokio::fs::read(path).await?;
        String::from_utf8(bytes).map_err(|e| RagError::UnsupportedFormat {
            path: path.to_path_buf(),
            reason: format!("content is not valid UTF-8: {e}"),
        })
    }

    fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                SUPPORTED_EXTENSIONS
                    .iter()
                    .any(|supported| ext.eq_ignore_ascii_case(supported))
            })
    }
}
