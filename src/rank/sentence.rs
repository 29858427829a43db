//! Sentence-transformer embeddings through fastembed (ONNX runtime).

use std::path::Path;
use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::info;

use crate::error::OracleError;
use crate::rank::embed::{Embedder, MINILM_MODEL};

const MINILM_DIMENSIONS: usize = 384;

pub struct SentenceEmbedder {
    model: Mutex<TextEmbedding>,
    name: &'static str,
    dimensions: usize,
}

impl SentenceEmbedder {
    /// all-MiniLM-L6-v2, mean-pooled and normalized. Weights are fetched into
    /// `cache_dir` (or fastembed's default cache) on first use.
    pub fn all_minilm_l6_v2(cache_dir: Option<&Path>) -> Result<Self, OracleError> {
        let mut options =
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir.to_path_buf());
        }

        let model = TextEmbedding::try_new(options).map_err(|e| OracleError::Embedding {
            provider: MINILM_MODEL.into(),
            reason: format!("loading model: {}", e),
        })?;
        info!(model = MINILM_MODEL, "sentence embedder ready");

        Ok(Self {
            model: Mutex::new(model),
            name: MINILM_MODEL,
            dimensions: MINILM_DIMENSIONS,
        })
    }
}

impl Embedder for SentenceEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, OracleError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut model = self.model.lock().map_err(|_| OracleError::Embedding {
            provider: self.name.into(),
            reason: "model lock poisoned".into(),
        })?;
        model
            .embed(texts.to_vec(), None)
            .map_err(|e| OracleError::Embedding {
                provider: self.name.into(),
                reason: e.to_string(),
            })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        self.name
    }
}
