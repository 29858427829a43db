//! Lexical weighting capability.
//!
//! A [`LexicalFitter`] builds a [`LexicalModel`] from a reference corpus; the
//! model then assigns one weight per text. The pipeline fits over the query
//! set, so weights measure overlap with query vocabulary rather than general
//! corpus statistics.

use std::collections::{BTreeMap, HashSet};

use crate::error::OracleError;
use crate::parser::tokenize::tokenize;

pub trait LexicalModel: Send + Sync {
    /// One weight per text, in order.
    fn weights(&self, texts: &[String]) -> Result<Vec<f32>, OracleError>;
}

pub trait LexicalFitter: Send + Sync {
    fn fit(&self, corpus: &[String]) -> Result<Box<dyn LexicalModel>, OracleError>;
}

/// Fits [`TfidfModel`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfidfFitter;

impl LexicalFitter for TfidfFitter {
    fn fit(&self, corpus: &[String]) -> Result<Box<dyn LexicalModel>, OracleError> {
        Ok(Box::new(TfidfModel::fit(corpus)?))
    }
}

/// TF-IDF over a fixed vocabulary.
///
/// `idf(t) = ln((1 + n) / (1 + df(t))) + 1`; a text's row of raw counts times
/// idf is L2-normalized, and its weight is the row mean over the whole
/// vocabulary. Weights lie in [0, 1]; a text sharing no vocabulary gets 0.
#[derive(Debug, Clone)]
pub struct TfidfModel {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f32>,
}

impl TfidfModel {
    pub fn fit(corpus: &[String]) -> Result<Self, OracleError> {
        if corpus.is_empty() {
            return Err(OracleError::Lexical("cannot fit on an empty corpus".into()));
        }

        let mut df: BTreeMap<String, usize> = BTreeMap::new();
        for doc in corpus {
            let unique: HashSet<String> = tokenize(doc).into_iter().collect();
            for term in unique {
                *df.entry(term).or_default() += 1;
            }
        }

        let n = corpus.len() as f32;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(df.len());
        for (i, (term, count)) in df.into_iter().enumerate() {
            idf.push(((1.0 + n) / (1.0 + count as f32)).ln() + 1.0);
            vocabulary.insert(term, i);
        }

        Ok(Self { vocabulary, idf })
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    fn weight(&self, text: &str) -> f32 {
        if self.vocabulary.is_empty() {
            return 0.0;
        }

        let mut counts: BTreeMap<usize, f32> = BTreeMap::new();
        for term in tokenize(text) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_default() += 1.0;
            }
        }
        if counts.is_empty() {
            return 0.0;
        }

        let row: Vec<f32> = counts.iter().map(|(&idx, &tf)| tf * self.idf[idx]).collect();
        let norm = row.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm <= f32::EPSILON {
            return 0.0;
        }
        row.iter().map(|x| x / norm).sum::<f32>() / self.vocabulary.len() as f32
    }
}

impl LexicalModel for TfidfModel {
    fn weights(&self, texts: &[String]) -> Result<Vec<f32>, OracleError> {
        Ok(texts.iter().map(|t| self.weight(t)).collect())
    }
}
