//! Vector store port

use crate::domain::errors::RagResult;
use crate::domain::models::{Metadata, ScoredRecord};
use async_trait::async_trait;

/// Persists documents with their vectors and answers nearest-neighbour queries
/// over a single named collection.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store `documents[i]` with `embeddings[i]` and `metadatas[i]`.
    ///
    /// Fails with `LengthMismatch` when the sequences (and `ids`, if given)
    /// disagree in length. Without `ids`, fresh ids are generated. Returns the
    /// ids in input order.
    async fn add(
        &self,
        documents: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        metadatas: Vec<Metadata>,
        ids: Option<Vec<String>>,
    ) -> RagResult<Vec<String>>;

    /// Up to `limit` records nearest to `embedding`, ascending by distance.
    async fn search(&self, embedding: &[f32], limit: usize) -> RagResult<Vec<ScoredRecord>>;

    /// Remove every record of the collection. The collection stays usable.
    async fn clear(&self) -> RagResult<()>;

    /// Number of records in the collection.
    async fn count(&self) -> RagResult<usize>;
}
