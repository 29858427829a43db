use crate::parser::normalize::clean_text;
use crate::rank::scorer::ScoreWeights;

/// One usable page of one document. Only built through [`PageRecord::new`],
/// which drops pages whose normalized text is shorter than the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    document_id: String,
    page_number: u32,
    raw_text: String,
    normalized_text: String,
}

impl PageRecord {
    /// `None` for page 0 or when normalized text has fewer than `min_chars` chars.
    pub fn new(
        document_id: impl Into<String>,
        page_number: u32,
        raw_text: impl Into<String>,
        min_chars: usize,
    ) -> Option<Self> {
        if page_number == 0 {
            return None;
        }
        let raw_text = raw_text.into();
        let normalized_text = clean_text(&raw_text);
        if normalized_text.chars().count() < min_chars {
            return None;
        }
        Some(Self {
            document_id: document_id.into(),
            page_number,
            raw_text,
            normalized_text,
        })
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn normalized_text(&self) -> &str {
        &self.normalized_text
    }
}

/// A page with its fused relevance. `score` is always
/// `w_sem * semantic_score + w_lex * lexical_score`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPage {
    page: PageRecord,
    score: f32,
    semantic_score: f32,
    lexical_score: f32,
}

impl ScoredPage {
    pub fn new(page: PageRecord, semantic_score: f32, lexical_score: f32, weights: ScoreWeights) -> Self {
        Self {
            score: weights.fuse(semantic_score, lexical_score),
            page,
            semantic_score,
            lexical_score,
        }
    }

    pub fn page(&self) -> &PageRecord {
        &self.page
    }

    pub fn document_id(&self) -> &str {
        self.page.document_id()
    }

    pub fn page_number(&self) -> u32 {
        self.page.page_number()
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn semantic_score(&self) -> f32 {
        self.semantic_score
    }

    pub fn lexical_score(&self) -> f32 {
        self.lexical_score
    }
}
