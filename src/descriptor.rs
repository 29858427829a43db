//! `input.json`: which documents to read and whose need to serve.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

pub const DESCRIPTOR_FILE: &str = "input.json";
/// Subdirectory searched when a document is not found next to the descriptor.
pub const FALLBACK_DIR: &str = "PDFs";

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentEntry {
    pub filename: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// `"persona": "Travel Planner"` or `"persona": {"role": "Travel Planner"}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Persona {
    Plain(String),
    Role { role: String },
}

/// `"job_to_be_done": "..."` or `"job_to_be_done": {"task": "..."}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Job {
    Plain(String),
    Task { task: String },
}

impl Persona {
    pub fn into_string(self) -> String {
        match self {
            Persona::Plain(s) | Persona::Role { role: s } => s,
        }
    }
}

impl Job {
    pub fn into_string(self) -> String {
        match self {
            Job::Plain(s) | Job::Task { task: s } => s,
        }
    }
}

/// Descriptor as written on disk. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDescriptor {
    pub documents: Vec<DocumentEntry>,
    pub persona: Persona,
    pub job_to_be_done: Job,
    #[serde(default)]
    pub challenge_info: Option<serde_json::Value>,
}

/// Descriptor with tagged unions flattened to plain strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub documents: Vec<String>,
    pub titles: Vec<Option<String>>,
    pub persona: String,
    pub job: String,
}

impl Descriptor {
    /// Read `<input_dir>/input.json`.
    pub fn load(input_dir: &Path) -> Result<Self, ConfigError> {
        let path = input_dir.join(DESCRIPTOR_FILE);
        if !path.is_file() {
            return Err(ConfigError::MissingDescriptor(path));
        }
        let body = std::fs::read_to_string(&path).map_err(|source| ConfigError::Unreadable {
            path: path.clone(),
            source,
        })?;
        Self::parse(&body).map_err(|e| match e {
            ParseFailure::Json(source) => ConfigError::Malformed { path, source },
            ParseFailure::NoDocuments => ConfigError::NoDocuments,
        })
    }

    pub fn from_json(body: &str) -> Result<Self, ConfigError> {
        Self::parse(body).map_err(|e| match e {
            ParseFailure::Json(source) => ConfigError::Malformed {
                path: PathBuf::from(DESCRIPTOR_FILE),
                source,
            },
            ParseFailure::NoDocuments => ConfigError::NoDocuments,
        })
    }

    fn parse(body: &str) -> Result<Self, ParseFailure> {
        let raw: RawDescriptor = serde_json::from_str(body).map_err(ParseFailure::Json)?;
        if raw.documents.is_empty() {
            return Err(ParseFailure::NoDocuments);
        }
        if raw.challenge_info.is_some() {
            debug!("ignoring challenge_info");
        }
        let (documents, titles) = raw
            .documents
            .into_iter()
            .map(|d| (d.filename, d.title))
            .unzip();
        Ok(Self {
            documents,
            titles,
            persona: raw.persona.into_string(),
            job: raw.job_to_be_done.into_string(),
        })
    }
}

enum ParseFailure {
    Json(serde_json::Error),
    NoDocuments,
}

/// Where `filename` lives: directly under `input_dir`, else under
/// `input_dir/PDFs`. `None` if neither exists.
pub fn resolve_document(input_dir: &Path, filename: &str) -> Option<PathBuf> {
    [input_dir.join(filename), input_dir.join(FALLBACK_DIR).join(filename)]
        .into_iter()
        .find(|p| p.is_file())
}
