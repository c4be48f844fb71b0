//! Sentence embedding seam.
//!
//! The semantic summary never loads a model itself. It talks to an
//! [`Embedder`], which the host initializes before use and tears down when the
//! page session ends. Two implementations ship with the crate:
//!
//! - [`HashingEmbedder`]: deterministic feature hashing over word tokens. Runs
//!   offline, needs no assets, and doubles as the test embedder.
//! - [`OpenAiEmbedder`] (feature `fetch`): any OpenAI-compatible `/embeddings`
//!   endpoint over async reqwest.
//!
//! # Example
//!
//! ```rust
//! use pagesense_core::embed::{EmbedOptions, Embedder, HashingEmbedder, cosine_similarity};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let embedder = HashingEmbedder::new(256);
//! embedder.init().await.unwrap();
//!
//! let a = embedder.embed("stable pages are easy to read", EmbedOptions::default()).await.unwrap();
//! let b = embedder.embed("stable pages are easy to read", EmbedOptions::default()).await.unwrap();
//! assert!(cosine_similarity(&a, &b).unwrap() > 0.999);
//! # });
//! ```

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{PagesenseError, Result};

/// How token vectors are pooled into one text vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Pooling {
    /// Average of all token vectors.
    #[default]
    Mean,
    /// Vector of the first token only.
    First,
}

/// Options for one embedding call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedOptions {
    pub pooling: Pooling,
    /// L2-normalize the pooled vector.
    pub normalize: bool,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self { pooling: Pooling::Mean, normalize: true }
    }
}

/// Sentence embedding capability.
///
/// `init` must complete before `embed` is called; implementations return
/// [`PagesenseError::EmbedderNotInitialized`] otherwise. Failed calls are not
/// retried by the engine.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Loads the model or opens the connection.
    async fn init(&self) -> Result<()>;

    /// Releases whatever `init` acquired. Embedding afterwards fails.
    async fn teardown(&self) -> Result<()>;

    /// Embeds one text.
    async fn embed(&self, text: &str, options: EmbedOptions) -> Result<Vec<f32>>;

    /// Length of the vectors `embed` returns.
    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Scales a vector to unit length in place. Zero vectors are left unchanged.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
}

/// `a·b / (|a||b|)`. A zero vector on either side scores 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(PagesenseError::DimensionMismatch { expected: a.len(), actual: b.len() });
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a * norm_b))
}

/// Offline embedder using signed feature hashing of lowercase word tokens.
///
/// Identical texts map to identical vectors and texts sharing words point in
/// similar directions, which is all the centroid selector needs.
#[derive(Debug)]
pub struct HashingEmbedder {
    dimension: usize,
    model: String,
    ready: AtomicBool,
}

impl HashingEmbedder {
    pub const DEFAULT_DIMENSION: usize = 384;

    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self { dimension, model: format!("hashing-{}", dimension), ready: AtomicBool::new(false) }
    }

    fn token_vector(&self, token: &str, into: &mut [f32]) {
        let hash = fnv1a(token.as_bytes());
        let index = (hash % self.dimension as u64) as usize;
        let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
        into[index] += sign;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn init(&self) -> Result<()> {
        self.ready.store(true, Ordering::SeqCst);
        tracing::debug!(model = %self.model, "embedder initialized");
        Ok(())
    }

    async fn teardown(&self) -> Result<()> {
        self.ready.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn embed(&self, text: &str, options: EmbedOptions) -> Result<Vec<f32>> {
        if !self.ready.load(Ordering::SeqCst) {
            return Err(PagesenseError::EmbedderNotInitialized { model: self.model.clone() });
        }

        let lowered = text.trim().to_lowercase();
        if lowered.is_empty() {
            return Err(PagesenseError::EmptyInput);
        }
        let mut tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        // Text without word characters hashes as a single token.
        if tokens.is_empty() {
            tokens.push(lowered.as_str());
        }

        let mut vector = vec![0.0f32; self.dimension];
        match options.pooling {
            Pooling::Mean => {
                for token in &tokens {
                    self.token_vector(token, &mut vector);
                }
                let n = tokens.len() as f32;
                vector.iter_mut().for_each(|v| *v /= n);
            }
            Pooling::First => self.token_vector(tokens[0], &mut vector),
        }

        if options.normalize {
            l2_normalize(&mut vector);
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    bytes.iter().fold(OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(PRIME))
}

#[cfg(feature = "fetch")]
pub use remote::OpenAiEmbedder;

#[cfg(feature = "fetch")]
mod remote {
    use super::*;
    use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
    use serde::Deserialize;
    use std::time::Duration;

    /// Embeddings client for OpenAI-compatible endpoints.
    ///
    /// The server pools tokens itself, so [`EmbedOptions::pooling`] is ignored;
    /// `normalize` is applied locally.
    pub struct OpenAiEmbedder {
        client: reqwest::Client,
        endpoint: String,
        model: String,
        dimensions: Option<usize>,
        ready: AtomicBool,
    }

    impl OpenAiEmbedder {
        /// Dimension of `text-embedding-3-small`, used when none is requested.
        pub const DEFAULT_DIMENSION: usize = 1536;

        /// Builds a client. `base_url` is the API root, e.g. `https://api.openai.com/v1`.
        pub fn new(
            api_key: Option<&str>, base_url: &str, model: &str, dimensions: Option<usize>, timeout: Duration,
        ) -> Result<Self> {
            if model.trim().is_empty() {
                return Err(PagesenseError::Embedding("missing embedding model name".to_string()));
            }

            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            if let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) {
                let value = HeaderValue::from_str(&format!("Bearer {}", key))
                    .map_err(|_| PagesenseError::Embedding("invalid API key".to_string()))?;
                headers.insert(AUTHORIZATION, value);
            }

            let client = reqwest::Client::builder()
                .timeout(timeout)
                .default_headers(headers)
                .build()?;

            Ok(Self {
                client,
                endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
                model: model.to_string(),
                dimensions,
                ready: AtomicBool::new(false),
            })
        }

        /// Full URL of the embeddings route.
        pub fn endpoint(&self) -> &str {
            &self.endpoint
        }
    }

    #[derive(Serialize)]
    struct EmbeddingRequest<'a> {
        model: &'a str,
        input: [&'a str; 1],
        #[serde(skip_serializing_if = "Option::is_none")]
        dimensions: Option<usize>,
    }

    #[derive(Deserialize)]
    struct EmbeddingResponse {
        data: Vec<EmbeddingData>,
    }

    #[derive(Deserialize)]
    struct EmbeddingData {
        embedding: Vec<f32>,
    }

    #[async_trait]
    impl Embedder for OpenAiEmbedder {
        async fn init(&self) -> Result<()> {
            self.ready.store(true, Ordering::SeqCst);
            tracing::debug!(model = %self.model, endpoint = %self.endpoint, "remote embedder initialized");
            Ok(())
        }

        async fn teardown(&self) -> Result<()> {
            self.ready.store(false, Ordering::SeqCst);
            Ok(())
        }

        async fn embed(&self, text: &str, options: EmbedOptions) -> Result<Vec<f32>> {
            if !self.ready.load(Ordering::SeqCst) {
                return Err(PagesenseError::EmbedderNotInitialized { model: self.model.clone() });
            }
            if text.trim().is_empty() {
                return Err(PagesenseError::EmptyInput);
            }

            let request = EmbeddingRequest { model: &self.model, input: [text], dimensions: self.dimensions };
            let response = self.client.post(&self.endpoint).json(&request).send().await?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<body unavailable>".to_string());
                return Err(PagesenseError::Embedding(format!("request failed ({}): {}", status, body)));
            }

            let parsed: EmbeddingResponse = response.json().await?;
            let mut vector = parsed
                .data
                .into_iter()
                .next()
                .map(|entry| entry.embedding)
                .ok_or_else(|| PagesenseError::Embedding("no embedding returned".to_string()))?;

            if let Some(expected) = self.dimensions
                && vector.len() != expected
            {
                return Err(PagesenseError::DimensionMismatch { expected, actual: vector.len() });
            }

            if options.normalize {
                l2_normalize(&mut vector);
            }
            Ok(vector)
        }

        fn dimension(&self) -> usize {
            self.dimensions.unwrap_or(Self::DEFAULT_DIMENSION)
        }

        fn model_name(&self) -> &str {
            &self.model
        }
    }
}
