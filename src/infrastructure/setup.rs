//! Service wiring
//!
//! Builds one [`RagService`] from a [`Config`]. Callers own the result and
//! pass it to whatever surface needs it; nothing is cached globally.

use crate::adapters::sqlite::PoolConfig;
use crate::domain::models::{Config, EmbeddingBackend};
use crate::domain::ports::EmbeddingModel;
use crate::infrastructure::documents::DocumentProcessor;
use crate::infrastructure::vector::{
    BertEmbeddingModel, HashingEmbeddingModel, SqliteVectorStore, TextChunker,
};
use crate::services::RagService;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Instantiate the configured embedding model.
///
/// The BERT backend may download weights on first use.
pub async fn build_embedding_model(config: &Config) -> Result<Arc<dyn EmbeddingModel>> {
    let embedding = &config.embedding;

    let model: Arc<dyn EmbeddingModel> = match embedding.backend {
        EmbeddingBackend::Hashing => Arc::new(HashingEmbeddingModel::new(
            embedding.dimensions,
            embedding
                .max_input_tokens
                .unwrap_or(crate::infrastructure::vector::hashing_model::DEFAULT_MAX_INPUT_TOKENS),
        )),
        EmbeddingBackend::Bert => {
            let repo = embedding.model.clone();
            let max_input_tokens = embedding.max_input_tokens;
            let model = tokio::task::spawn_blocking(move || {
                BertEmbeddingModel::load(&repo, max_input_tokens)
            })
            .await
            .context("embedding model loader panicked")?
            .with_context(|| format!("Failed to load embedding model {}", embedding.model))?;
            Arc::new(model)
        }
    };

    tracing::info!(
        backend = %embedding.backend,
        model = model.name(),
        dimensions = model.dimensions(),
        max_input_tokens = model.max_input_tokens(),
        "embedding model ready"
    );

    Ok(model)
}

/// Open the vector store configured in `config.database`.
pub async fn build_vector_store(config: &Config) -> Result<SqliteVectorStore> {
    let pool_config = PoolConfig {
        max_connections: config.database.max_connections,
        ..PoolConfig::default()
    };

    SqliteVectorStore::open(
        Path::new(&config.database.path),
        &config.database.collection,
        Some(pool_config),
    )
    .await
    .with_context(|| format!("Failed to open vector store at {}", config.database.path))
}

/// Wire chunker, embedding model, store and extractor into a service.
pub async fn build_rag_service(config: &Config) -> Result<RagService> {
    let chunker = TextChunker::with_encoding(&config.chunking.encoding)
        .context("Failed to initialize text chunker")?;
    let store = build_vector_store(config).await?;
    let embedder = build_embedding_model(config).await?;

    Ok(RagService::new(
        Arc::new(chunker),
        embedder,
        Arc::new(store),
        Arc::new(DocumentProcessor::new()),
    ))
}
