//! Embedding providers and cosine distance.
//!
//! ```text
//! EmbeddingProvider (trait)
//! ├── embed(&str) -> Vec<f32>               // Single text embedding
//! ├── embed_batch(&[&str]) -> Vec<Vec<f32>> // Batch embedding
//! ├── dimension() -> usize                  // Output dimension (0 if unknown)
//! └── model_name() -> &str                  // Model identifier
//!
//! HashingEmbedder   local, deterministic feature hashing (tests, offline)
//! OllamaEmbedder    POST {endpoint}/api/embed on a running Ollama server (default)
//! ```

use super::tokens::word_tokens;
use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Converts text to dense vectors.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts.
    ///
    /// Default implementation calls `embed` for each text.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Output dimension of embeddings.
    fn dimension(&self) -> usize;

    /// Model name/identifier.
    fn model_name(&self) -> &str;
}

/// Cosine distance `1 - cos(a, b)`.
///
/// Mismatched, empty or zero-norm vectors have similarity 0, so distance 1.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    1.0 - cosine_similarity(a, b)
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f64::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

/// Element-wise mean of equally sized vectors; empty input gives an empty vector.
pub fn centroid(vectors: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = vectors.first() else {
        return Vec::new();
    };
    let mut sum = vec![0.0f64; first.len()];
    for v in vectors {
        for (acc, x) in sum.iter_mut().zip(v) {
            *acc += *x as f64;
        }
    }
    let n = vectors.len() as f64;
    sum.into_iter().map(|s| (s / n) as f32).collect()
}

// ============================================
// Hashing embedder
// ============================================

/// Weight of a whole-word feature relative to a character trigram.
const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Local embedder using signed feature hashing.
///
/// Features are lowercased words and character trigrams of each padded
/// word; each is hashed with SHA-256 into one of `dimension` buckets with a
/// hash-derived sign. The result is L2 normalised. Identical text always
/// maps to the identical vector, so runs are reproducible without a model
/// download.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::ModelUnavailable(
                "hashing embedder needs a non-zero dimension".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }

    fn add_trigrams(&self, vector: &mut [f32], word: &str) {
        let padded: Vec<char> = format!(" {word} ").chars().collect();
        for window in padded.windows(3) {
            let gram: String = window.iter().collect();
            self.add_feature(vector, &format!("c:{gram}"), TRIGRAM_WEIGHT);
        }
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];
        let words = word_tokens(text);

        if words.is_empty() {
            let trimmed = text.trim().to_lowercase();
            if !trimmed.is_empty() {
                self.add_trigrams(&mut vector, &trimmed);
            }
        }
        for word in &words {
            self.add_feature(&mut vector, &format!("w:{word}"), WORD_WEIGHT);
            self.add_trigrams(&mut vector, word);
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hashing"
    }
}

// ============================================
// Ollama embedder
// ============================================

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embeddings from an Ollama server's `/api/embed` endpoint.
pub struct OllamaEmbedder {
    http_client: reqwest::blocking::Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    /// Create a client for the configured endpoint and model.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let base_url = config.endpoint.trim_end_matches('/').to_string();

        let http_client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::ModelUnavailable(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            model: config.model.clone(),
        })
    }
}

impl EmbeddingProvider for OllamaEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| Error::Embedding("empty embedding response".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let request_body = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request_body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    Error::ModelUnavailable(format!("cannot reach Ollama at {}: {}", self.base_url, e))
                } else {
                    Error::Embedding(format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::ModelUnavailable(format!(
                "Ollama model {} not found",
                self.model
            )));
        }
        if !status.is_success() {
            let error_text = response.text().unwrap_or_else(|_| "unknown".to_string());
            return Err(Error::Embedding(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let result: EmbedResponse = response
            .json()
            .map_err(|e| Error::Embedding(format!("failed to parse response: {}", e)))?;

        if result.embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                result.embeddings.len()
            )));
        }
        Ok(result.embeddings)
    }

    fn dimension(&self) -> usize {
        0
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
