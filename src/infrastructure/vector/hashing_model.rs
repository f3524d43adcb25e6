//! Deterministic feature-hashing embedding model
//!
//! Hashes lowercase word unigrams and bigrams into a fixed number of signed
//! buckets and L2-normalizes the result. Texts sharing vocabulary land close
//! together under cosine distance, which makes the model usable offline and
//! in tests where downloading BERT weights is not an option.

use crate::domain::errors::RagResult;
use crate::domain::ports::EmbeddingModel;
use async_trait::async_trait;

/// Default vector width, matching all-MiniLM-L6-v2.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Default input limit, matching all-MiniLM-L6-v2.
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 256;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Feature-hashing embedder.
#[derive(Debug, Clone)]
pub struct HashingEmbeddingModel {
    dimensions: usize,
    max_input_tokens: usize,
}

impl Default for HashingEmbeddingModel {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS, DEFAULT_MAX_INPUT_TOKENS)
    }
}

impl HashingEmbeddingModel {
    /// Both values are clamped to at least 1.
    pub fn new(dimensions: usize, max_input_tokens: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            max_input_tokens: max_input_tokens.max(1),
        }
    }

    /// Embed synchronously. Only the first `max_input_tokens` words count.
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; self.dimensions];

        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .take(self.max_input_tokens)
            .map(str::to_lowercase)
            .collect();

        for word in &words {
            self.accumulate(&mut embedding, word.as_bytes(), 1.0);
        }
        for pair in words.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.accumulate(&mut embedding, bigram.as_bytes(), 0.5);
        }

        let magnitude = embedding
            .iter()
            .map(|x| f64::from(*x) * f64::from(*x))
            .sum::<f64>()
            .sqrt();

        if magnitude > 1e-10 {
            #[allow(clippy::cast_possible_truncation)]
            let magnitude = magnitude as f32;
            for val in &mut embedding {
                *val /= magnitude;
            }
        } else {
            #[allow(clippy::cast_precision_loss)]
            let uniform = 1.0 / (self.dimensions as f32).sqrt();
            embedding.fill(uniform);
        }

        embedding
    }

    fn accumulate(&self, embedding: &mut [f32], feature: &[u8], weight: f32) {
        let hash = fnv1a(feature);
        #[allow(clippy::cast_possible_truncation)]
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        embedding[bucket] += sign * weight;
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

#[async_trait]
impl EmbeddingModel for HashingEmbeddingModel {
    async fn embed(&self, text: &str) -> RagResult<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> RagResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_sync(text)).collect())
    }

    fn max_input_tokens(&self) -> usize {
        self.max_input_tokens
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashing"
    }
}
