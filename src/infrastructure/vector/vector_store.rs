//! SQLite-backed vector store
//!
//! Records live in one named collection. Embeddings are stored as
//! little-endian `f32` blobs and searched exhaustively in Rust with cosine
//! distance (`1 - cos θ`, 0 = identical, 2 = opposite). Results are ascending
//! by distance; ties keep insertion order.

use crate::adapters::sqlite::{
    all_embedded_migrations, create_pool, verify_connection, Migrator, PoolConfig,
};
use crate::domain::errors::{RagError, RagResult};
use crate::domain::models::{Metadata, ScoredRecord};
use crate::domain::ports::VectorStore;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use std::path::Path;

/// Prefix of generated record ids.
pub const GENERATED_ID_PREFIX: &str = "doc_";

/// Vector store over a single SQLite collection.
#[derive(Debug, Clone)]
pub struct SqliteVectorStore {
    pool: SqlitePool,
    collection: String,
    collection_id: i64,
}

impl SqliteVectorStore {
    /// Open the store in `store_dir`, creating the directory, schema and
    /// collection as needed.
    pub async fn open(
        store_dir: &Path,
        collection: &str,
        pool_config: Option<PoolConfig>,
    ) -> RagResult<Self> {
        let pool = create_pool(store_dir, pool_config)
            .await
            .map_err(RagError::collaborator)?;
        verify_connection(&pool)
            .await
            .map_err(RagError::collaborator)?;
        Self::with_pool(pool, collection).await
    }

    /// Use an existing pool. Migrations run before the collection is resolved.
    pub async fn with_pool(pool: SqlitePool, collection: &str) -> RagResult<Self> {
        Migrator::new(&pool)
            .run(&all_embedded_migrations())
            .await
            .map_err(RagError::collaborator)?;

        sqlx::query("INSERT OR IGNORE INTO collections (name) VALUES (?)")
            .bind(collection)
            .execute(&pool)
            .await?;

        let collection_id: i64 = sqlx::query("SELECT id FROM collections WHERE name = ?")
            .bind(collection)
            .fetch_one(&pool)
            .await?
            .get("id");

        tracing::debug!(collection, collection_id, "vector store collection ready");

        Ok(Self {
            pool,
            collection: collection.to_string(),
            collection_id,
        })
    }

    /// Serialize embedding vector to bytes for storage
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding vector from bytes
    fn bytes_to_embedding(bytes: &[u8]) -> RagResult<Vec<f32>> {
        if bytes.len() % 4 != 0 {
            return Err(RagError::Collaborator(format!(
                "stored embedding has invalid byte length {}",
                bytes.len()
            )));
        }

        Ok(bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect())
    }

    /// Cosine distance between two vectors.
    ///
    /// Mismatched lengths and zero-magnitude vectors are maximally distant.
    pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return f32::MAX;
        }

        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if mag_a == 0.0 || mag_b == 0.0 {
            return f32::MAX;
        }

        1.0 - (dot / (mag_a * mag_b))
    }
}

fn check_lengths(
    documents: &[String],
    embeddings: &[Vec<f32>],
    metadatas: &[Metadata],
    ids: Option<&Vec<String>>,
) -> RagResult<()> {
    let n = documents.len();
    let ids_len = ids.map(Vec::len);
    if embeddings.len() != n || metadatas.len() != n || ids_len.is_some_and(|len| len != n) {
        return Err(RagError::LengthMismatch {
            documents: n,
            embeddings: embeddings.len(),
            metadatas: metadatas.len(),
            ids: ids_len,
        });
    }

    if let Some(first) = embeddings.first() {
        if let Some(bad) = embeddings.iter().find(|e| e.len() != first.len()) {
            return Err(RagError::InvalidInput(format!(
                "embeddings must share one dimension, got {} and {}",
                first.len(),
                bad.len()
            )));
        }
    }

    Ok(())
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn add(
        &self,
        documents: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        metadatas: Vec<Metadata>,
        ids: Option<Vec<String>>,
    ) -> RagResult<Vec<String>> {
        check_lengths(&documents, &embeddings, &metadatas, ids.as_ref())?;

        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;

        let ids = match ids {
            Some(ids) => ids,
            None => {
                let (existing,): (i64,) =
                    sqlx::query_as("SELECT COUNT(*) FROM records WHERE collection_id = ?")
                        .bind(self.collection_id)
                        .fetch_one(&mut *tx)
                        .await?;
                let taken: HashSet<String> = sqlx::query_scalar(
                    "SELECT id FROM records WHERE collection_id = ? AND id LIKE ?",
                )
                .bind(self.collection_id)
                .bind(format!("{GENERATED_ID_PREFIX}%"))
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .collect();

                let base = usize::try_from(existing).unwrap_or_default();
                (base..)
                    .map(|n| format!("{GENERATED_ID_PREFIX}{n}"))
                    .filter(|id| !taken.contains(id))
                    .take(documents.len())
                    .collect()
            }
        };

        for (((id, document), embedding), metadata) in
            ids.iter().zip(&documents).zip(&embeddings).zip(&metadatas)
        {
            let dimensions = i64::try_from(embedding.len()).unwrap_or(i64::MAX);
            sqlx::query(
                r"
                INSERT INTO records (collection_id, id, document, embedding, dimensions, metadata)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(self.collection_id)
            .bind(id)
            .bind(document)
            .bind(Self::embedding_to_bytes(embedding))
            .bind(dimensions)
            .bind(serde_json::to_string(metadata)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            collection = %self.collection,
            added = ids.len(),
            "stored records"
        );

        Ok(ids)
    }

    async fn search(&self, embedding: &[f32], limit: usize) -> RagResult<Vec<ScoredRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r"
            SELECT id, document, embedding, metadata
            FROM records
            WHERE collection_id = ?
            ORDER BY seq
            ",
        )
        .bind(self.collection_id)
        .fetch_all(&self.pool)
        .await?;

        let mut results = Vec::with_capacity(rows.len());

        for row in rows {
            let bytes: Vec<u8> = row.get("embedding");
            let stored = Self::bytes_to_embedding(&bytes)?;
            if stored.len() != embedding.len() {
                return Err(RagError::InvalidInput(format!(
                    "query has {} dimensions but the collection stores {}",
                    embedding.len(),
                    stored.len()
                )));
            }

            let metadata_json: String = row.get("metadata");
            results.push(ScoredRecord {
                id: row.get("id"),
                document: row.get("document"),
                metadata: serde_json::from_str(&metadata_json)?,
                distance: Self::cosine_distance(embedding, &stored),
            });
        }

        // Stable sort keeps insertion order among equal distances.
        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results.truncate(limit);

        Ok(results)
    }

    async fn clear(&self) -> RagResult<()> {
        let result = sqlx::query("DELETE FROM records WHERE collection_id = ?")
            .bind(self.collection_id)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            collection = %self.collection,
            removed = result.rows_affected(),
            "cleared collection"
        );
        Ok(())
    }

    async fn count(&self) -> RagResult<usize> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM records WHERE collection_id = ?")
                .bind(self.collection_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_memory_pool;
    use crate::domain::models::MetadataValue;

    async fn memory_store(collection: &str) -> SqliteVectorStore {
        let pool = create_memory_pool().await.unwrap();
        SqliteVectorStore::with_pool(pool, collection).await.unwrap()
    }

    fn meta(source: &str) -> Metadata {
        let mut map = Metadata::new();
        map.insert("source".into(), MetadataValue::from(source));
        map
    }

    #[test]
    fn test_embedding_serialization() {
        let embedding = vec![1.0_f32, -2.5, 0.0, 3.25];
        let bytes = SqliteVectorStore::embedding_to_bytes(&embedding);
        assert_eq!(bytes.len(), 16);
        assert_eq!(
            SqliteVectorStore::bytes_to_embedding(&bytes).unwrap(),
            embedding
        );
        assert!(SqliteVectorStore::bytes_to_embedding(&[0, 1, 2]).is_err());
    }

    #[test]
    fn test_cosine_distance() {
        let a = [1.0_f32, 0.0];
        let b = [0.0_f32, 1.0];
        assert!(SqliteVectorStore::cosine_distance(&a, &a).abs() < 1e-6);
        assert!((SqliteVectorStore::cosine_distance(&a, &b) - 1.0).abs() < 1e-6);
        assert!((SqliteVectorStore::cosine_distance(&a, &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
        assert_eq!(SqliteVectorStore::cosine_distance(&a, &[1.0]), f32::MAX);
        assert_eq!(SqliteVectorStore::cosine_distance(&a, &[0.0, 0.0]), f32::MAX);
    }

    #[tokio::test]
    async fn test_add_generates_sequential_ids() {
        let store = memory_store("test").await;

        let ids = store
            .add(
                vec!["a".into(), "b".into()],
                vec![vec![1.0, 0.0], vec![0.0, 1.0]],
                vec![meta("x"), meta("x")],
                None,
            )
            .await
            .unwrap();
        assert_eq!(ids, vec!["doc_0", "doc_1"]);

        let ids = store
            .add(vec!["c".into()], vec![vec![1.0, 1.0]], vec![meta("y")], None)
            .await
            .unwrap();
        assert_eq!(ids, vec!["doc_2"]);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_generated_ids_skip_explicit_ones() {
        let store = memory_store("test").await;

        store
            .add(
                vec!["a".into()],
                vec![vec![1.0]],
                vec![meta("x")],
                Some(vec!["doc_1".into()]),
            )
            .await
            .unwrap();

        let ids = store
            .add(
                vec!["b".into(), "c".into()],
                vec![vec![1.0], vec![1.0]],
                vec![meta("x"), meta("x")],
                None,
            )
            .await
            .unwrap();
        assert_eq!(ids, vec!["doc_2", "doc_3"]);

        store
            .add(
                vec!["d".into()],
                vec![vec![1.0]],
                vec![meta("x")],
                Some(vec!["doc_4".into()]),
            )
            .await
            .unwrap();
        let ids = store
            .add(vec!["e".into()], vec![vec![1.0]], vec![meta("x")], None)
            .await
            .unwrap();
        assert_eq!(ids, vec!["doc_5"]);
        assert_eq!(store.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_add_rejects_length_mismatch() {
        let store = memory_store("test").await;

        let err = store
            .add(vec!["a".into(), "b".into()], vec![vec![1.0]], vec![meta("x"), meta("x")], None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::LengthMismatch {
                documents: 2,
                embeddings: 1,
                ..
            }
        ));

        let err = store
            .add(
                vec!["a".into()],
                vec![vec![1.0]],
                vec![meta("x")],
                Some(vec!["one".into(), "two".into()]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::LengthMismatch { ids: Some(2), .. }));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_explicit_ids_fail() {
        let store = memory_store("test").await;
        let ids = Some(vec!["same".to_string()]);

        store
            .add(vec!["a".into()], vec![vec![1.0]], vec![meta("x")], ids.clone())
            .await
            .unwrap();
        assert!(store
            .add(vec!["b".into()], vec![vec![1.0]], vec![meta("x")], ids)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_search_orders_by_distance_then_insertion() {
        let store = memory_store("test").await;
        store
            .add(
                vec!["far".into(), "near".into(), "tie".into()],
                vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![2.0, 0.0]],
                vec![meta("far"), meta("near"), meta("tie")],
                None,
            )
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 5).await.unwrap();
        let documents: Vec<&str> = results.iter().map(|r| r.document.as_str()).collect();
        assert_eq!(documents, vec!["near", "tie", "far"]);
        assert_eq!(results[0].metadata, meta("near"));

        let top = store.search(&[1.0, 0.0], 1).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, "doc_1");

        assert!(store.search(&[1.0, 0.0], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_dimension_mismatch() {
        let store = memory_store("test").await;
        store
            .add(vec!["a".into()], vec![vec![1.0, 0.0]], vec![meta("x")], None)
            .await
            .unwrap();
        assert!(matches!(
            store.search(&[1.0, 0.0, 0.0], 3).await,
            Err(RagError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_keeps_collection_usable() {
        let store = memory_store("test").await;
        store
            .add(vec!["a".into()], vec![vec![1.0]], vec![meta("x")], None)
            .await
            .unwrap();

        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.search(&[1.0], 5).await.unwrap().is_empty());

        let ids = store
            .add(vec!["b".into()], vec![vec![1.0]], vec![meta("x")], None)
            .await
            .unwrap();
        assert_eq!(ids, vec!["doc_0"]);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let pool = create_memory_pool().await.unwrap();
        let first = SqliteVectorStore::with_pool(pool.clone(), "first").await.unwrap();
        let second = SqliteVectorStore::with_pool(pool, "second").await.unwrap();

        first
            .add(vec!["a".into()], vec![vec![1.0]], vec![meta("x")], None)
            .await
            .unwrap();

        assert_eq!(first.count().await.unwrap(), 1);
        assert_eq!(second.count().await.unwrap(), 0);
        second.clear().await.unwrap();
        assert_eq!(first.count().await.unwrap(), 1);
    }
}
