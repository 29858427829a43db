//! Top-K selection with at most one page per document.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::InputError;
use crate::page::ScoredPage;

/// How equal scores are ordered before the greedy walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Ascending `(document_id, page_number)`.
    #[default]
    DocumentPage,
    /// Keep discovery order (stable sort on score only).
    InsertionOrder,
}

/// Up to K pages, descending score, no two from the same document.
#[derive(Debug, Clone, Default)]
pub struct RankedSelection {
    entries: Vec<ScoredPage>,
}

impl RankedSelection {
    pub fn entries(&self) -> &[ScoredPage] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredPage> {
        self.entries.iter()
    }
}

/// Greedy diversity-constrained top-K.
///
/// Returns `min(k, distinct documents)` entries.
pub fn rank(
    mut scored: Vec<ScoredPage>,
    k: usize,
    tie_break: TieBreak,
) -> Result<RankedSelection, InputError> {
    if k == 0 {
        return Err(InputError::ZeroK);
    }

    scored.sort_by(|a, b| {
        let by_score = by_score_desc(a.score(), b.score());
        match tie_break {
            TieBreak::DocumentPage => by_score
                .then_with(|| a.document_id().cmp(b.document_id()))
                .then_with(|| a.page_number().cmp(&b.page_number())),
            TieBreak::InsertionOrder => by_score,
        }
    });

    let mut seen: HashSet<String> = HashSet::new();
    let mut entries = Vec::with_capacity(k);
    for page in scored {
        if entries.len() == k {
            break;
        }
        if seen.insert(page.document_id().to_string()) {
            entries.push(page);
        }
    }

    Ok(RankedSelection { entries })
}

/// Descending, NaN last.
fn by_score_desc(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
