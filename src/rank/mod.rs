pub mod diversity;
pub mod embed;
pub mod lexical;
pub mod queries;
pub mod scorer;
#[cfg(feature = "semantic")]
pub mod sentence;

pub use diversity::{rank, RankedSelection, TieBreak};
pub use embed::{build_embedder, Embedder, HashingEmbedder};
pub use lexical::{LexicalFitter, TfidfFitter};
pub use queries::{expand, QuerySet};
pub use scorer::{RelevanceScorer, ScoreWeights};
