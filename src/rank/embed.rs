//! Embedding capability.
//!
//! The scorer only sees `&dyn Embedder`, so other models
//! or test doubles can be swapped in. [`HashingEmbedder`] is the built-in
//! offline default; [`build_embedder`] picks one by model name.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, OracleError, PipelineError};
use crate::parser::tokenize::tokenize;

pub const HASHING_MODEL: &str = "hashing";
pub const MINILM_MODEL: &str = "all-minilm-l6-v2";
pub const KNOWN_MODELS: &[&str] = &[HASHING_MODEL, MINILM_MODEL];

/// Maps a batch of texts to fixed-length vectors, one per text, in order.
pub trait Embedder: Send + Sync {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, OracleError>;

    fn dimensions(&self) -> usize;

    fn name(&self) -> &str;
}

/// Feature-hashing embedder over unigrams and adjacent bigrams.
///
/// Terms are hashed with FNV-1a into `dimensions` buckets and weighted with
/// sublinear term frequency. Vectors are L2-normalized and non-negative, so
/// cosine similarity between two of them lies in [0, 1].
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(term: &str, dims: usize) -> usize {
        let mut h: u64 = 0xcbf29ce484222325;
        for b in term.as_bytes() {
            h ^= *b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        (h % dims as u64) as usize
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        let mut vec = vec![0.0f32; self.dimensions];
        if tokens.is_empty() {
            return vec;
        }

        // ordered so bucket sums are reproducible run to run
        let mut counts: BTreeMap<String, f32> = BTreeMap::new();
        for tok in &tokens {
            *counts.entry(tok.clone()).or_default() += 1.0;
        }
        for pair in tokens.windows(2) {
            *counts.entry(format!("{} {}", pair[0], pair[1])).or_default() += 0.5;
        }

        for (term, count) in &counts {
            vec[Self::bucket(term, self.dimensions)] += 1.0 + count.ln().max(0.0);
        }

        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vec {
                *v /= norm;
            }
        }
        vec
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl Embedder for HashingEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, OracleError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

/// Embedder for a configured model name.
///
/// `dimensions` only applies to the hashing model. The sentence model is
/// available when built with the `semantic` feature and downloads its weights
/// into `cache_dir` on first use.
#[cfg_attr(not(feature = "semantic"), allow(unused_variables))]
pub fn build_embedder(
    model: &str,
    dimensions: usize,
    cache_dir: Option<&Path>,
) -> Result<Box<dyn Embedder>, PipelineError> {
    match model {
        HASHING_MODEL => Ok(Box::new(HashingEmbedder::new(dimensions))),
        #[cfg(feature = "semantic")]
        MINILM_MODEL => Ok(Box::new(
            crate::rank::sentence::SentenceEmbedder::all_minilm_l6_v2(cache_dir)?,
        )),
        #[cfg(not(feature = "semantic"))]
        MINILM_MODEL => Err(ConfigError::InvalidSetting {
            key: "embedding_model",
            reason: format!("`{}` needs a build with the `semantic` feature", model),
        }
        .into()),
        other => Err(ConfigError::InvalidSetting {
            key: "embedding_model",
            reason: format!("unknown model `{}`", other),
        }
        .into()),
    }
}

/// Cosine similarity; 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut na = 0.0f32;
    let mut nb = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na <= f32::EPSILON || nb <= f32::EPSILON {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embed(e: &HashingEmbedder, text: &str) -> Vec<f32> {
        e.embed_batch(&[text.to_string()]).unwrap().remove(0)
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let e = HashingEmbedder::new(64);
        let v = embed(&e, "");
        assert_eq!(v.len(), 64);
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn unit_norm() {
        let e = HashingEmbedder::default();
        let v = embed(&e, "coastal towns and seaside restaurants");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "expected unit norm, got {norm}");
    }

    #[test]
    fn batch_preserves_order_and_length() {
        let e = HashingEmbedder::new(128);
        let texts = vec!["beach holidays".to_string(), "tax forms".to_string()];
        let batch = e.embed_batch(&texts).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], embed(&e, "beach holidays"));
        assert_eq!(batch[1], embed(&e, "tax forms"));
    }

    #[test]
    fn related_texts_score_higher() {
        let e = HashingEmbedder::default();
        let a = embed(&e, "nightlife bars and clubs in Nice");
        let b = embed(&e, "the best bars and clubs for nightlife");
        let c = embed(&e, "filling in payroll forms");
        assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
    }

    #[test]
    fn cosine_bounds() {
        let e = HashingEmbedder::default();
        let a = embed(&e, "hiking trails");
        let b = embed(&e, "mountain hiking");
        let s = cosine_similarity(&a, &b);
        assert!((0.0..=1.0 + 1e-6).contains(&s));
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn hashing_model_by_name() {
        let e = build_embedder(HASHING_MODEL, 32, None).unwrap();
        assert_eq!(e.name(), "hashing");
        assert_eq!(e.dimensions(), 32);
    }

    #[test]
    fn unknown_model_name_rejected() {
        let err = build_embedder("glove-6b", 32, None).err().unwrap();
        assert!(matches!(
            err,
            PipelineError::Config(ConfigError::InvalidSetting { key: "embedding_model", .. })
        ));
    }

    #[cfg(not(feature = "semantic"))]
    #[test]
    fn sentence_model_needs_feature() {
        let err = build_embedder(MINILM_MODEL, 32, None).err().unwrap();
        assert!(err.to_string().contains("semantic"));
    }

    #[test]
    fn cosine_of_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
