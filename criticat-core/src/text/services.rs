//! Text-analysis services shared by all metrics.
//!
//! Heavy resources are owned by one [`TextServices`] value that the binary
//! builds once and lends to every metric call. The segmenter is built up
//! front; the embedding provider is built on first use, at most once, and a
//! failed construction is remembered and reported on every later use.

use super::embedding::{EmbeddingProvider, HashingEmbedder, OllamaEmbedder};
use super::segment::{CatalanSegmenter, Segmenter};
use crate::config::{EmbeddingConfig, EmbeddingProviderKind};
use crate::error::{Error, Result};
use std::sync::OnceLock;

type EmbedderSlot = std::result::Result<Box<dyn EmbeddingProvider>, String>;

pub struct TextServices {
    segmenter: Box<dyn Segmenter>,
    embedding: EmbeddingConfig,
    embedder: OnceLock<EmbedderSlot>,
}

impl TextServices {
    /// Services configured from `embedding`; nothing is loaded yet.
    pub fn new(embedding: &EmbeddingConfig) -> Self {
        Self {
            segmenter: Box::new(CatalanSegmenter::new()),
            embedding: embedding.clone(),
            embedder: OnceLock::new(),
        }
    }

    /// Services with an already constructed embedder.
    pub fn with_embedder(embedder: Box<dyn EmbeddingProvider>) -> Self {
        let services = Self::new(&EmbeddingConfig::default());
        let _ = services.embedder.set(Ok(embedder));
        services
    }

    /// Services whose embedder is permanently unavailable.
    pub fn without_embedder() -> Self {
        let services = Self::new(&EmbeddingConfig::default());
        let _ = services
            .embedder
            .set(Err("embedding provider disabled".to_string()));
        services
    }

    /// Replace the segmenter.
    pub fn with_segmenter(mut self, segmenter: Box<dyn Segmenter>) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn segmenter(&self) -> &dyn Segmenter {
        self.segmenter.as_ref()
    }

    /// The embedding provider, constructing it on first call.
    pub fn embedder(&self) -> Result<&dyn EmbeddingProvider> {
        match self.embedder.get_or_init(|| build_embedder(&self.embedding)) {
            Ok(embedder) => Ok(embedder.as_ref()),
            Err(message) => Err(Error::ModelUnavailable(message.clone())),
        }
    }

    /// Whether the embedder has been constructed (successfully or not).
    pub fn embedder_initialized(&self) -> bool {
        self.embedder.get().is_some()
    }
}

impl Default for TextServices {
    fn default() -> Self {
        Self::new(&EmbeddingConfig::default())
    }
}

fn build_embedder(config: &EmbeddingConfig) -> EmbedderSlot {
    let built: Result<Box<dyn EmbeddingProvider>> = match config.provider {
        EmbeddingProviderKind::Hashing => HashingEmbedder::new(config.dimension)
            .map(|e| Box::new(e) as Box<dyn EmbeddingProvider>),
        EmbeddingProviderKind::Ollama => {
            OllamaEmbedder::new(config).map(|e| Box::new(e) as Box<dyn EmbeddingProvider>)
        }
        EmbeddingProviderKind::None => Err(Error::ModelUnavailable(
            "embedding provider disabled".to_string(),
        )),
    };

    match built {
        Ok(embedder) => {
            if config.provider == EmbeddingProviderKind::Hashing {
                tracing::warn!(
                    dimension = config.dimension,
                    "Hashing embedder in use: divergence reflects word overlap, not meaning"
                );
            }
            tracing::info!(
                provider = config.provider.as_str(),
                model = embedder.model_name(),
                "Embedding provider loaded"
            );
            Ok(embedder)
        }
        Err(e) => {
            tracing::error!(provider = config.provider.as_str(), error = %e, "Embedding provider unavailable");
            Err(e.to_string())
        }
    }
}
