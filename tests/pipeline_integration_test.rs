//! End-to-end ingest/query/reset tests against a real SQLite store.

mod helpers;

use helpers::{setup_test_logging, temp_dir, test_service, write_file, TEST_MAX_INPUT_TOKENS};
use rag_mcp::domain::models::{IngestOptions, Source, STRING_INPUT_SOURCE};
use rag_mcp::infrastructure::vector::{token_windows, TextChunker};
use rag_mcp::RagError;

const FOX: &str = "The quick brown fox jumps over the lazy dog near the riverbank.";
const PLANTS: &str = "Photosynthesis converts sunlight into chemical energy inside green leaves.";
const TOKIO: &str = "Tokio is an asynchronous runtime powering many networked Rust services.";

#[tokio::test]
async fn test_empty_store_query_returns_nothing() {
    let dir = temp_dir();
    let service = test_service(dir.path()).await;

    let results = service.query("anything at all", 5).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_verbatim_phrase_is_top_hit() {
    setup_test_logging();
    let dir = temp_dir();
    let service = test_service(dir.path()).await;

    for (text, name) in [(FOX, "fox"), (PLANTS, "plants"), (TOKIO, "tokio")] {
        service
            .ingest(Source::named_literal(text, name), &IngestOptions::default())
            .await
            .unwrap();
    }

    let results = service
        .query("asynchronous runtime powering many networked Rust", 1)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].rank, 1);
    assert_eq!(results[0].metadata.source, "tokio");
    assert!(results[0]
        .document
        .contains("asynchronous runtime powering many networked Rust"));
}

#[tokio::test]
async fn test_results_are_ordered_by_distance() {
    let dir = temp_dir();
    let service = test_service(dir.path()).await;

    for text in [FOX, PLANTS, TOKIO] {
        service
            .ingest(Source::literal(text), &IngestOptions::default())
            .await
            .unwrap();
    }

    let results = service.query(PLANTS, 3).await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].document, PLANTS);
    assert!(results[0].distance < 1e-4);
    assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
    assert_eq!(
        results.iter().map(|r| r.rank).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert!(results
        .iter()
        .all(|r| r.metadata.source == STRING_INPUT_SOURCE));
}

#[tokio::test]
async fn test_oversized_chunk_size_is_clamped() {
    let dir = temp_dir();
    let service = test_service(dir.path()).await;
    let chunker = TextChunker::new().unwrap();

    let text = "the quick brown fox jumps over the lazy dog ".repeat(120);
    let total_tokens = chunker.count_tokens(&text);
    assert!(total_tokens > TEST_MAX_INPUT_TOKENS * 2);

    let report = service
        .ingest(
            Source::named_literal(text, "long"),
            &IngestOptions::default().with_chunk_size(2000),
        )
        .await
        .unwrap();

    assert_eq!(report.effective_chunk_size, TEST_MAX_INPUT_TOKENS);
    let expected = token_windows(total_tokens, TEST_MAX_INPUT_TOKENS, 50).unwrap();
    assert_eq!(report.chunks_ingested, expected.len());

    let stored = service.query("lazy dog", 100).await.unwrap();
    assert_eq!(stored.len(), report.chunks_ingested);
    for result in &stored {
        assert!(chunker.count_tokens(&result.document) <= TEST_MAX_INPUT_TOKENS);
    }

    let mut indices: Vec<usize> = stored.iter().map(|r| r.metadata.chunk_index).collect();
    indices.sort_unstable();
    assert_eq!(indices, (0..report.chunks_ingested).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_reset_empties_store_and_keeps_it_usable() {
    let dir = temp_dir();
    let service = test_service(dir.path()).await;

    service
        .ingest(Source::literal(FOX), &IngestOptions::default())
        .await
        .unwrap();
    assert_eq!(service.query("fox", 5).await.unwrap().len(), 1);

    service.reset_vector_store().await.unwrap();
    assert!(service.query("fox", 5).await.unwrap().is_empty());
    assert_eq!(service.stored_chunks().await.unwrap(), 0);

    let report = service
        .ingest(Source::literal(TOKIO), &IngestOptions::default())
        .await
        .unwrap();
    assert_eq!(report.ids, vec!["doc_0"]);
    assert_eq!(service.query("tokio", 5).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_tags_round_trip_in_order() {
    let dir = temp_dir();
    let service = test_service(dir.path()).await;

    service
        .ingest(
            Source::literal(FOX),
            &IngestOptions::default().with_tags(["a", "b"]),
        )
        .await
        .unwrap();
    service
        .ingest(Source::literal(PLANTS), &IngestOptions::default())
        .await
        .unwrap();

    let results = service.query(FOX, 2).await.unwrap();
    assert_eq!(results[0].metadata.tags, vec!["a", "b"]);
    assert!(results[1].metadata.tags.is_empty());
}

#[tokio::test]
async fn test_comma_in_tag_is_rejected() {
    let dir = temp_dir();
    let service = test_service(dir.path()).await;

    let err = service
        .ingest(
            Source::literal(FOX),
            &IngestOptions::default().with_tags(["a,b"]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::InvalidArgument(_)));
    assert_eq!(service.stored_chunks().await.unwrap(), 0);
}

#[tokio::test]
async fn test_glob_ingests_only_matching_files() {
    let dir = temp_dir();
    let docs = dir.path().join("docs");
    std::fs::create_dir(&docs).unwrap();
    let a = write_file(&docs, "a.txt", FOX);
    let b = write_file(&docs, "b.txt", PLANTS);
    write_file(&docs, "c.md", TOKIO);

    let service = test_service(dir.path()).await;
    let pattern = docs.join("*.txt").display().to_string();
    let report = service
        .ingest_many(&[pattern], &IngestOptions::default())
        .await;

    let mut succeeded = report.succeeded.clone();
    succeeded.sort();
    let mut expected = vec![a.display().to_string(), b.display().to_string()];
    expected.sort();
    assert_eq!(succeeded, expected);
    assert!(report.failed.is_empty());

    let results = service.query(TOKIO, 10).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.metadata.source.ends_with(".txt")));
}

#[tokio::test]
async fn test_batch_reports_unsupported_and_missing_files() {
    let dir = temp_dir();
    let good = write_file(dir.path(), "good.txt", FOX);
    let markdown = write_file(dir.path(), "notes.md", PLANTS);
    let missing = dir.path().join("missing.txt");

    let service = test_service(dir.path()).await;
    let report = service
        .ingest_many(
            &[
                good.display().to_string(),
                markdown.display().to_string(),
                missing.display().to_string(),
            ],
            &IngestOptions::default(),
        )
        .await;

    assert_eq!(report.succeeded, vec![good.display().to_string()]);
    assert_eq!(report.failed.len(), 2);
    assert_eq!(report.failed[0].source, markdown.display().to_string());
    assert_eq!(report.failed[1].source, missing.display().to_string());
    assert!(report.failed.iter().all(|f| !f.skipped));

    let summary = report.summary();
    assert!(summary.starts_with("Ingestion complete. Successfully ingested 1 file(s)."));
    assert!(summary.contains("(Error: "));
}

#[tokio::test]
async fn test_single_file_ingest_errors() {
    let dir = temp_dir();
    let service = test_service(dir.path()).await;

    let err = service
        .ingest(
            Source::file(dir.path().join("absent.txt")),
            &IngestOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::NotFound(_)));

    let pdf = write_file(dir.path(), "paper.pdf", "%PDF-1.4");
    let err = service
        .ingest(Source::file(pdf), &IngestOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::UnsupportedFormat { .. }));
}

#[tokio::test]
async fn test_blank_file_ingests_nothing() {
    let dir = temp_dir();
    let blank = write_file(dir.path(), "blank.txt", "  \n\n ");
    let service = test_service(dir.path()).await;

    let report = service
        .ingest(Source::file(&blank), &IngestOptions::default())
        .await
        .unwrap();
    assert_eq!(report.chunks_ingested, 0);
    assert_eq!(service.stored_chunks().await.unwrap(), 0);
}
