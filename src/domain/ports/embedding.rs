//! Embedding model port

use crate::domain::errors::RagResult;
use async_trait::async_trait;

/// Turns text into fixed-width vectors.
///
/// Implementations must return exactly one vector per input, in input order,
/// and every vector must have [`dimensions`](Self::dimensions) entries. Empty
/// strings are valid input.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> RagResult<Vec<f32>>;

    /// Embed many texts in one call.
    async fn embed_batch(&self, texts: &[String]) -> RagResult<Vec<Vec<f32>>>;

    /// Largest input, in tokens, the model consumes without truncating.
    fn max_input_tokens(&self) -> usize;

    /// Width of the produced vectors.
    fn dimensions(&self) -> usize;

    /// Identifier shown in logs and status output.
    fn name(&self) -> &str;
}
