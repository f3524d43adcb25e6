//! RAG (Retrieval-Augmented Generation) service
//!
//! Orchestrates extraction, chunking, embedding and storage for ingestion, and
//! embedding plus nearest-neighbour search for queries. All collaborators are
//! injected; the service holds no global state.

use crate::domain::errors::{RagError, RagResult};
use crate::domain::models::{
    normalize_tags, BatchIngestReport, ChunkMetadata, IngestOptions, IngestOutcome, IngestReport,
    QueryResult, Source, NOT_A_FILE,
};
use crate::domain::ports::{EmbeddingModel, TextExtractor, VectorStore};
use crate::infrastructure::vector::TextChunker;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default number of results returned by [`RagService::query`].
pub const DEFAULT_NUM_RESULTS: usize = 5;

/// Chunk size actually used for an ingest.
///
/// Without a request the model limit is used. Requests above the limit are
/// clamped to it with a warning.
pub fn resolve_chunk_size(requested: Option<usize>, max_input_tokens: usize) -> usize {
    match requested {
        None => max_input_tokens,
        Some(requested) if requested > max_input_tokens => {
            tracing::warn!(
                requested,
                effective = max_input_tokens,
                "Requested chunk_size ({requested}) exceeds embedding model's max input tokens \
                 ({max_input_tokens}). Using effective_chunk_size of {max_input_tokens}."
            );
            max_input_tokens
        }
        Some(requested) => requested,
    }
}

/// RAG orchestrator.
pub struct RagService {
    chunker: Arc<TextChunker>,
    embedder: Arc<dyn EmbeddingModel>,
    store: Arc<dyn VectorStore>,
    extractor: Arc<dyn TextExtractor>,
}

impl RagService {
    pub fn new(
        chunker: Arc<TextChunker>,
        embedder: Arc<dyn EmbeddingModel>,
        store: Arc<dyn VectorStore>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        Self {
            chunker,
            embedder,
            store,
            extractor,
        }
    }

    pub fn embedder(&self) -> &dyn EmbeddingModel {
        self.embedder.as_ref()
    }

    /// Number of chunks currently stored.
    pub async fn stored_chunks(&self) -> RagResult<usize> {
        self.store.count().await
    }

    /// Ingest one file or literal text.
    ///
    /// Blank text is not an error: it is logged and reported with zero chunks.
    pub async fn ingest(&self, source: Source, options: &IngestOptions) -> RagResult<IngestReport> {
        let tags = normalize_tags(&options.tags)?;
        let source_name = source.resolve_name(options.source_name.as_deref());
        let effective_chunk_size =
            resolve_chunk_size(options.chunk_size, self.embedder.max_input_tokens());

        let text = match &source {
            Source::File(path) => self.extractor.extract(path).await?,
            Source::Literal { text, .. } => text.clone(),
        };

        if text.trim().is_empty() {
            tracing::warn!(source = %source_name, "No text content to ingest");
            return Ok(IngestReport::empty(source_name, effective_chunk_size));
        }

        let chunks =
            self.chunker
                .chunk_text(&text, effective_chunk_size, options.chunk_overlap)?;

        if chunks.is_empty() {
            tracing::warn!(source = %source_name, "Text produced no chunks");
            return Ok(IngestReport::empty(source_name, effective_chunk_size));
        }

        let embeddings = self.embedder.embed_batch(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::LengthMismatch {
                documents: chunks.len(),
                embeddings: embeddings.len(),
                metadatas: chunks.len(),
                ids: None,
            });
        }

        let timestamp = chrono::Utc::now().to_rfc3339();
        let metadatas = (0..chunks.len())
            .map(|chunk_index| {
                ChunkMetadata {
                    source: source_name.clone(),
                    chunk_index,
                    timestamp: timestamp.clone(),
                    tags: tags.clone(),
                }
                .to_metadata()
            })
            .collect();

        let chunk_count = chunks.len();
        let ids = self.store.add(chunks, embeddings, metadatas, None).await?;

        tracing::info!(
            source = %source_name,
            chunks = chunk_count,
            chunk_size = effective_chunk_size,
            "Ingested {chunk_count} chunks from {source_name}"
        );

        Ok(IngestReport {
            source: source_name,
            chunks_ingested: chunk_count,
            effective_chunk_size,
            ids,
        })
    }

    /// Ingest every file matched by `patterns`, in order.
    ///
    /// Never fails as a whole: each match ends up in `succeeded` or `failed`.
    /// Every chunk is attributed to its file path; `source_name` is ignored.
    pub async fn ingest_many<S: AsRef<str>>(
        &self,
        patterns: &[S],
        options: &IngestOptions,
    ) -> BatchIngestReport {
        let options = &IngestOptions {
            source_name: None,
            ..options.clone()
        };
        let mut report = BatchIngestReport::default();

        for pattern in patterns {
            let pattern = pattern.as_ref();
            match expand_pattern(pattern) {
                Ok(matches) => {
                    for entry in matches {
                        match entry {
                            Ok(path) => report.record(self.ingest_path(path, options).await),
                            Err(outcome) => report.record(outcome),
                        }
                    }
                }
                Err(reason) => {
                    tracing::error!(pattern, %reason, "Invalid file pattern");
                    report.record(IngestOutcome::Failed {
                        source: pattern.to_string(),
                        reason,
                    });
                }
            }
        }

        report
    }

    async fn ingest_path(&self, path: PathBuf, options: &IngestOptions) -> IngestOutcome {
        let shown = path.display().to_string();

        if let Ok(metadata) = tokio::fs::metadata(&path).await {
            if !metadata.is_file() {
                tracing::warn!(path = %shown, "Skipping: not a file");
                return IngestOutcome::Skipped {
                    source: shown,
                    reason: NOT_A_FILE.to_string(),
                };
            }
        }

        match self.ingest(Source::File(path), options).await {
            Ok(mut report) => {
                report.source = shown;
                IngestOutcome::Succeeded(report)
            }
            Err(err) => {
                tracing::error!(path = %shown, error = %err, "Failed to ingest file");
                IngestOutcome::Failed {
                    source: shown,
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Nearest chunks to `text`, ranked from 1 in store order.
    pub async fn query(&self, text: &str, num_results: usize) -> RagResult<Vec<QueryResult>> {
        if num_results == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(text).await?;
        let records = self.store.search(&embedding, num_results).await?;

        tracing::debug!(results = records.len(), "query complete");

        Ok(records
            .into_iter()
            .enumerate()
            .map(|(i, record)| QueryResult::from_record(i + 1, record))
            .collect())
    }

    /// Remove every stored chunk. The store stays usable.
    pub async fn reset_vector_store(&self) -> RagResult<()> {
        self.store.clear().await?;
        tracing::info!("Vector store reset");
        Ok(())
    }
}

/// Whether `pattern` uses glob syntax and needs expansion.
pub fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Entries matched by `pattern`. A pattern without glob syntax is returned as
/// is so a missing file is reported instead of silently matching nothing.
/// Entries the walk could not read come back as failed outcomes.
fn expand_pattern(pattern: &str) -> Result<Vec<Result<PathBuf, IngestOutcome>>, String> {
    if !has_glob_meta(pattern) {
        return Ok(vec![Ok(PathBuf::from(pattern))]);
    }

    let entries: Vec<_> = glob::glob(pattern)
        .map_err(|e| format!("invalid pattern: {e}"))?
        .map(|entry| entry.map_err(|e| unreadable_match(e.path(), e.error())))
        .collect();

    if entries.is_empty() {
        tracing::warn!(pattern, "Pattern matched no files");
    }
    Ok(entries)
}

fn unreadable_match(path: &Path, error: &io::Error) -> IngestOutcome {
    tracing::error!(path = %path.display(), %error, "Unreadable glob match");
    IngestOutcome::Failed {
        source: path.display().to_string(),
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Metadata, ScoredRecord};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Embeds every text as `[len, 1.0]` and counts calls.
    struct CountingEmbedder {
        max_input_tokens: usize,
        single_calls: Mutex<usize>,
        batch_calls: Mutex<usize>,
    }

    impl CountingEmbedder {
        fn new(max_input_tokens: usize) -> Self {
            Self {
                max_input_tokens,
                single_calls: Mutex::new(0),
                batch_calls: Mutex::new(0),
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn vector_for(text: &str) -> Vec<f32> {
        vec![text.len() as f32, 1.0]
    }

    #[async_trait]
    impl EmbeddingModel for CountingEmbedder {
        async fn embed(&self, text: &str) -> RagResult<Vec<f32>> {
            *self.single_calls.lock().unwrap() += 1;
            Ok(vector_for(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> RagResult<Vec<Vec<f32>>> {
            *self.batch_calls.lock().unwrap() += 1;
            Ok(texts.iter().map(|t| vector_for(t)).collect())
        }

        fn max_input_tokens(&self) -> usize {
            self.max_input_tokens
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    /// Records every `add` call and answers searches with canned records.
    #[derive(Default)]
    struct RecordingStore {
        adds: Mutex<Vec<(Vec<String>, Vec<Metadata>)>>,
        canned: Vec<ScoredRecord>,
        cleared: Mutex<usize>,
    }

    #[async_trait]
    impl VectorStore for RecordingStore {
        async fn add(
            &self,
            documents: Vec<String>,
            _embeddings: Vec<Vec<f32>>,
            metadatas: Vec<Metadata>,
            _ids: Option<Vec<String>>,
        ) -> RagResult<Vec<String>> {
            let ids = (0..documents.len()).map(|i| format!("doc_{i}")).collect();
            self.adds.lock().unwrap().push((documents, metadatas));
            Ok(ids)
        }

        async fn search(&self, _embedding: &[f32], limit: usize) -> RagResult<Vec<ScoredRecord>> {
            Ok(self.canned.iter().take(limit).cloned().collect())
        }

        async fn clear(&self) -> RagResult<()> {
            *self.cleared.lock().unwrap() += 1;
            Ok(())
        }

        async fn count(&self) -> RagResult<usize> {
            Ok(self.adds.lock().unwrap().iter().map(|(d, _)| d.len()).sum())
        }
    }

    struct FixedExtractor(&'static str);

    #[async_trait]
    impl TextExtractor for FixedExtractor {
        async fn extract(&self, path: &Path) -> RagResult<String> {
            if path.ends_with("missing.txt") {
                return Err(RagError::NotFound(path.to_path_buf()));
            }
            Ok(self.0.to_string())
        }

        fn supports(&self, _path: &Path) -> bool {
            true
        }
    }

    fn service_with(
        max_input_tokens: usize,
        store: RecordingStore,
        text: &'static str,
    ) -> (RagService, Arc<CountingEmbedder>, Arc<RecordingStore>) {
        let embedder = Arc::new(CountingEmbedder::new(max_input_tokens));
        let store = Arc::new(store);
        let service = RagService::new(
            Arc::new(TextChunker::new().unwrap()),
            embedder.clone(),
            store.clone(),
            Arc::new(FixedExtractor(text)),
        );
        (service, embedder, store)
    }

    #[test]
    fn test_resolve_chunk_size() {
        assert_eq!(resolve_chunk_size(None, 256), 256);
        assert_eq!(resolve_chunk_size(Some(100), 256), 100);
        assert_eq!(resolve_chunk_size(Some(256), 256), 256);
        assert_eq!(resolve_chunk_size(Some(2000), 256), 256);
    }

    #[test]
    fn test_expand_literal_pattern() {
        let entries = expand_pattern("/no/such/file.txt").unwrap();
        assert_eq!(entries.len(), 1);
        assert!(matches!(&entries[0], Ok(path) if path == Path::new("/no/such/file.txt")));
        assert!(expand_pattern("[").is_err());
        assert!(has_glob_meta("docs/*.txt"));
        assert!(!has_glob_meta("docs/a.txt"));
    }

    #[test]
    fn test_unreadable_match_is_recorded_as_failure() {
        let error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
        let mut report = BatchIngestReport::default();
        report.record(unreadable_match(Path::new("/locked/sub"), &error));

        assert!(report.succeeded.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].source, "/locked/sub");
        assert_eq!(report.failed[0].reason, "permission denied");
        assert!(!report.failed[0].skipped);
    }

    #[tokio::test]
    async fn test_ingest_makes_one_batch_and_one_add() {
        let (service, embedder, store) = service_with(8, RecordingStore::default(), "");
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let options = IngestOptions::default()
            .with_chunk_overlap(2)
            .with_tags(["alpha", "beta"]);

        let report = service
            .ingest(Source::named_literal(text, "numbers"), &options)
            .await
            .unwrap();

        assert_eq!(report.source, "numbers");
        assert_eq!(report.effective_chunk_size, 8);
        assert!(report.chunks_ingested > 1);
        assert_eq!(*embedder.batch_calls.lock().unwrap(), 1);
        assert_eq!(*embedder.single_calls.lock().unwrap(), 0);

        let adds = store.adds.lock().unwrap();
        assert_eq!(adds.len(), 1);
        let (documents, metadatas) = &adds[0];
        assert_eq!(documents.len(), report.chunks_ingested);

        let parsed: Vec<ChunkMetadata> = metadatas.iter().map(ChunkMetadata::from_metadata).collect();
        for (i, meta) in parsed.iter().enumerate() {
            assert_eq!(meta.chunk_index, i);
            assert_eq!(meta.source, "numbers");
            assert_eq!(meta.tags, vec!["alpha", "beta"]);
            assert_eq!(meta.timestamp, parsed[0].timestamp);
        }
        assert!(chrono::DateTime::parse_from_rfc3339(&parsed[0].timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_blank_text_skips_collaborators() {
        let (service, embedder, store) = service_with(64, RecordingStore::default(), "");

        let report = service
            .ingest(Source::literal("   \n\t"), &IngestOptions::default().with_chunk_overlap(0))
            .await
            .unwrap();

        assert_eq!(report.chunks_ingested, 0);
        assert_eq!(report.source, "string_input");
        assert_eq!(*embedder.batch_calls.lock().unwrap(), 0);
        assert!(store.adds.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overlap_not_below_effective_size_fails() {
        let (service, _embedder, store) = service_with(16, RecordingStore::default(), "");

        let err = service
            .ingest(
                Source::literal("some text"),
                &IngestOptions::default().with_chunk_size(100).with_chunk_overlap(16),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RagError::InvalidArgument(_)));
        assert!(store.adds.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_source_uses_path_as_name() {
        let (service, _embedder, store) =
            service_with(64, RecordingStore::default(), "file body text");

        let report = service
            .ingest(Source::file("/docs/a.txt"), &IngestOptions::default().with_chunk_overlap(4))
            .await
            .unwrap();
        assert_eq!(report.source, "/docs/a.txt");
        assert_eq!(store.adds.lock().unwrap()[0].0, vec!["file body text"]);

        let err = service
            .ingest(Source::file("/docs/missing.txt"), &IngestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_query_preserves_store_order() {
        let canned = [("z", 0.1_f32), ("a", 0.2), ("m", 0.3)]
            .iter()
            .enumerate()
            .map(|(i, (doc, distance))| ScoredRecord {
                id: format!("doc_{i}"),
                document: (*doc).to_string(),
                metadata: ChunkMetadata {
                    source: "s".into(),
                    chunk_index: i,
                    timestamp: "t".into(),
                    tags: vec![],
                }
                .to_metadata(),
                distance: *distance,
            })
            .collect();
        let store = RecordingStore {
            canned,
            ..RecordingStore::default()
        };
        let (service, embedder, _store) = service_with(64, store, "");

        let results = service.query("anything", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[0].document, "z");
        assert_eq!(results[1].rank, 2);
        assert_eq!(results[1].document, "a");
        assert_eq!(*embedder.single_calls.lock().unwrap(), 1);

        assert!(service.query("anything", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_clears_store() {
        let (service, _embedder, store) = service_with(64, RecordingStore::default(), "");
        service.reset_vector_store().await.unwrap();
        assert_eq!(*store.cleared.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ingest_many_records_failures_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("a.txt");
        std::fs::write(&existing, "ignored").unwrap();
        let missing = dir.path().join("missing.txt");

        let (service, _embedder, _store) = service_with(64, RecordingStore::default(), "body");
        let patterns = vec![
            missing.display().to_string(),
            dir.path().display().to_string(),
            existing.display().to_string(),
        ];

        let report = service
            .ingest_many(&patterns, &IngestOptions::default().with_chunk_overlap(4))
            .await;

        assert_eq!(report.succeeded, vec![existing.display().to_string()]);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].source, missing.display().to_string());
        assert!(report.failed[0].reason.contains("not found"));
        assert_eq!(report.failed[1].reason, NOT_A_FILE);
        assert!(report.failed[1].skipped);
    }
}
