use crate::error::{InputError, OracleError, ScoreError};
use crate::page::{PageRecord, ScoredPage};
use crate::rank::embed::{cosine_similarity, Embedder};
use crate::rank::lexical::{LexicalFitter, LexicalModel};
use crate::rank::queries::QuerySet;

/// Fusion weights. Expected to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub semantic: f32,
    pub lexical: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            semantic: 0.7,
            lexical: 0.3,
        }
    }
}

impl ScoreWeights {
    pub fn fuse(&self, semantic: f32, lexical: f32) -> f32 {
        self.semantic * semantic + self.lexical * lexical
    }
}

/// Scores pages against a fixed query set.
///
/// Queries are embedded once and the lexical model is fitted once, at
/// construction. Each [`score_pages`](Self::score_pages) call embeds its whole
/// batch in one oracle call.
pub struct RelevanceScorer<'a> {
    embedder: &'a dyn Embedder,
    lexical: Box<dyn LexicalModel>,
    query_vectors: Vec<Vec<f32>>,
    dimensions: usize,
    weights: ScoreWeights,
}

impl<'a> RelevanceScorer<'a> {
    pub fn new(
        queries: &QuerySet,
        embedder: &'a dyn Embedder,
        fitter: &dyn LexicalFitter,
        weights: ScoreWeights,
    ) -> Result<Self, ScoreError> {
        if queries.is_empty() {
            return Err(InputError::EmptyQueries.into());
        }

        let query_vectors = embedder.embed_batch(queries.as_slice())?;
        let dimensions = check_batch(&query_vectors, queries.len(), None)?;
        let lexical = fitter.fit(queries.as_slice())?;

        Ok(Self {
            embedder,
            lexical,
            query_vectors,
            dimensions,
            weights,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Score one batch of pages; one `ScoredPage` per input, same order.
    pub fn score_pages(&self, pages: Vec<PageRecord>) -> Result<Vec<ScoredPage>, ScoreError> {
        if pages.is_empty() {
            return Err(InputError::EmptyPages.into());
        }

        let texts: Vec<String> = pages.iter().map(|p| p.normalized_text().to_string()).collect();
        let page_vectors = self.embedder.embed_batch(&texts)?;
        check_batch(&page_vectors, texts.len(), Some(self.dimensions))?;

        let lexical = self.lexical.weights(&texts)?;
        if lexical.len() != texts.len() {
            return Err(OracleError::Lexical(format!(
                "model returned {} weights for {} texts",
                lexical.len(),
                texts.len()
            ))
            .into());
        }

        Ok(pages
            .into_iter()
            .zip(page_vectors)
            .zip(lexical)
            .map(|((page, vector), lexical_score)| {
                let semantic_score = self.semantic_score(&vector);
                ScoredPage::new(page, semantic_score, lexical_score, self.weights)
            })
            .collect())
    }

    /// Best match over all queries.
    fn semantic_score(&self, page_vector: &[f32]) -> f32 {
        self.query_vectors
            .iter()
            .map(|q| cosine_similarity(q, page_vector))
            .fold(f32::NEG_INFINITY, f32::max)
    }
}

/// One-shot scoring of a single batch.
pub fn score(
    queries: &QuerySet,
    pages: Vec<PageRecord>,
    embedder: &dyn Embedder,
    fitter: &dyn LexicalFitter,
    weights: ScoreWeights,
) -> Result<Vec<ScoredPage>, ScoreError> {
    if pages.is_empty() {
        return Err(InputError::EmptyPages.into());
    }
    RelevanceScorer::new(queries, embedder, fitter, weights)?.score_pages(pages)
}

/// Validate an embedding batch; returns its dimensionality.
fn check_batch(
    vectors: &[Vec<f32>],
    expected_len: usize,
    expected_dim: Option<usize>,
) -> Result<usize, InputError> {
    if vectors.len() != expected_len {
        return Err(InputError::BatchSizeMismatch {
            expected: expected_len,
            got: vectors.len(),
        });
    }
    let dim = expected_dim
        .or_else(|| vectors.first().map(Vec::len))
        .unwrap_or(0);
    if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
        return Err(InputError::DimensionMismatch {
            expected: dim,
            got: bad.len(),
        });
    }
    Ok(dim)
}
