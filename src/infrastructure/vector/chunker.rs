//! Token sliding-window chunker
//!
//! Splits text into windows of at most `chunk_size` BPE tokens, consecutive
//! windows sharing `chunk_overlap` tokens. Token counts follow tiktoken's
//! `cl100k_base` encoding unless another encoding is configured.

use crate::domain::errors::{RagError, RagResult};
use std::ops::Range;
use tiktoken_rs::CoreBPE;

/// Encoding used when none is configured.
pub const DEFAULT_ENCODING: &str = "cl100k_base";

/// One chunk together with the token range it was decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenChunk {
    pub text: String,
    pub token_range: Range<usize>,
}

/// Token-aware text chunker.
pub struct TextChunker {
    encoding: String,
    bpe: CoreBPE,
}

impl TextChunker {
    /// Chunker over `cl100k_base`.
    pub fn new() -> RagResult<Self> {
        Self::with_encoding(DEFAULT_ENCODING)
    }

    /// Chunker over a named tiktoken encoding.
    pub fn with_encoding(encoding: &str) -> RagResult<Self> {
        let bpe = match encoding {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "r50k_base" => tiktoken_rs::r50k_base(),
            other => {
                return Err(RagError::InvalidArgument(format!(
                    "unknown tokenizer encoding: {other}"
                )))
            }
        }
        .map_err(|e| RagError::Collaborator(format!("Failed to load tokenizer: {e}")))?;

        Ok(Self {
            encoding: encoding.to_string(),
            bpe,
        })
    }

    /// Number of tokens in `text`. Special-token text is accepted.
    pub fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    /// Split `text` into overlapping token windows.
    ///
    /// Fails with `InvalidArgument` when `chunk_overlap >= chunk_size`. Text
    /// that encodes to no tokens yields no chunks.
    pub fn chunk_text(
        &self,
        text: &str,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> RagResult<Vec<String>> {
        Ok(self
            .chunk_with_spans(text, chunk_size, chunk_overlap)?
            .into_iter()
            .map(|chunk| chunk.text)
            .collect())
    }

    /// Like [`chunk_text`](Self::chunk_text) but keeps each window's token range.
    pub fn chunk_with_spans(
        &self,
        text: &str,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> RagResult<Vec<TokenChunk>> {
        validate_window(chunk_size, chunk_overlap)?;

        if text.is_empty() {
            return Ok(Vec::new());
        }

        let tokens = self.bpe.encode_with_special_tokens(text);
        let windows = token_windows(tokens.len(), chunk_size, chunk_overlap)?;

        Ok(windows
            .into_iter()
            .map(|range| TokenChunk {
                text: self.decode(&tokens[range.clone()]),
                token_range: range,
            })
            .collect())
    }

    fn decode(&self, tokens: &[u32]) -> String {
        // A window edge can split a multi-byte character; keep what decodes.
        match self.bpe.decode(tokens.to_vec()) {
            Ok(text) => text,
            Err(_) => {
                let bytes: Vec<u8> = self
                    .bpe
                    ._decode_native_and_split(tokens.to_vec())
                    .flatten()
                    .collect();
                String::from_utf8_lossy(&bytes).into_owned()
            }
        }
    }
}

impl std::fmt::Debug for TextChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextChunker")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

fn validate_window(chunk_size: usize, chunk_overlap: usize) -> RagResult<()> {
    if chunk_overlap >= chunk_size {
        return Err(RagError::InvalidArgument(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Window ranges over `total` tokens.
///
/// The first window starts at 0, each next one `chunk_size - chunk_overlap`
/// tokens later, and the last one ends exactly at `total`.
pub fn token_windows(
    total: usize,
    chunk_size: usize,
    chunk_overlap: usize,
) -> RagResult<Vec<Range<usize>>> {
    validate_window(chunk_size, chunk_overlap)?;

    let step = chunk_size - chunk_overlap;
    let mut windows = Vec::with_capacity(total.div_ceil(step));
    let mut start = 0;

    while start < total {
        let end = (start + chunk_size).min(total);
        windows.push(start..end);
        if end == total {
            break;
        }
        start += step;
    }

    Ok(windows)
}
