//! Error types for the digest pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for a digest run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Descriptor or settings are missing or malformed.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// No document produced a single usable page.
    #[error(transparent)]
    NoContent(#[from] NoContentError),

    /// Embedding or lexical weighting failed.
    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Scorer or ranker called with invalid input.
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// Run aborted between documents (cancel token or deadline).
    #[error("run cancelled during {stage}")]
    Cancelled { stage: &'static str },

    /// Writing the digest failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("descriptor not found at {}", .0.display())]
    MissingDescriptor(PathBuf),

    #[error("could not read descriptor {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed descriptor {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("descriptor lists no documents")]
    NoDocuments,

    #[error("invalid setting `{key}`: {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    #[error("settings: {0}")]
    Layered(#[from] config::ConfigError),
}

/// A named document could not be turned into pages. Recoverable: the
/// document is skipped and the run continues.
#[derive(Error, Debug)]
#[error("document {} unavailable: {reason}", .path.display())]
pub struct DocumentUnavailable {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Error, Debug)]
#[error("no valid pages found in any of {documents} document(s)")]
pub struct NoContentError {
    pub documents: usize,
}

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("embedding failed ({provider}): {reason}")]
    Embedding { provider: String, reason: String },

    #[error("lexical weighting failed: {0}")]
    Lexical(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum InputError {
    #[error("no pages to score")]
    EmptyPages,

    #[error("no queries to score against")]
    EmptyQueries,

    #[error("invalid embedding dimension: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("embedder returned {got} vectors for {expected} texts")]
    BatchSizeMismatch { expected: usize, got: usize },

    #[error("top-k must be greater than zero")]
    ZeroK,
}

/// Errors raised while scoring a batch of pages.
#[derive(Error, Debug)]
pub enum ScoreError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl From<ScoreError> for PipelineError {
    fn from(e: ScoreError) -> Self {
        match e {
            ScoreError::Input(e) => PipelineError::Input(e),
            ScoreError::Oracle(e) => PipelineError::Oracle(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
