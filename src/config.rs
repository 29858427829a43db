use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rank::diversity::TieBreak;
use crate::rank::embed::{HASHING_MODEL, KNOWN_MODELS};
use crate::rank::scorer::ScoreWeights;

/// Name of the optional settings file looked up in the input directory.
pub const SETTINGS_FILE: &str = "persona_digest.toml";

const ENV_PREFIX: &str = "DIGEST";

/// Run settings, layered: defaults → TOML file → `DIGEST_*` env → CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub top_k: usize,
    pub semantic_weight: f32,
    pub lexical_weight: f32,
    /// Pages whose normalized text has fewer characters are dropped.
    pub min_page_chars: usize,
    pub embedding_dimensions: usize,
    /// `hashing` (offline) or `all-minilm-l6-v2` (needs the `semantic` feature).
    pub embedding_model: String,
    /// Where downloaded model files are cached.
    #[serde(default)]
    pub model_cache_dir: Option<String>,
    pub show_progress: bool,
    #[serde(default)]
    pub deadline_secs: Option<u64>,
    /// Rank ties by discovery order instead of (document, page).
    pub legacy_tie_break: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            top_k: 5,
            semantic_weight: 0.7,
            lexical_weight: 0.3,
            min_page_chars: 50,
            embedding_dimensions: 384,
            embedding_model: HASHING_MODEL.to_string(),
            model_cache_dir: None,
            show_progress: true,
            deadline_secs: None,
            legacy_tie_break: false,
        }
    }
}

impl Settings {
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let d = Settings::default();
        let mut builder = Config::builder()
            .set_default("top_k", d.top_k as i64)?
            .set_default("semantic_weight", d.semantic_weight as f64)?
            .set_default("lexical_weight", d.lexical_weight as f64)?
            .set_default("min_page_chars", d.min_page_chars as i64)?
            .set_default("embedding_dimensions", d.embedding_dimensions as i64)?
            .set_default("embedding_model", d.embedding_model.as_str())?
            .set_default("show_progress", d.show_progress)?
            .set_default("legacy_tie_break", d.legacy_tie_break)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        let settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(invalid("top_k", "must be greater than zero"));
        }
        if self.min_page_chars == 0 {
            return Err(invalid("min_page_chars", "must be greater than zero"));
        }
        if self.embedding_dimensions == 0 {
            return Err(invalid("embedding_dimensions", "must be greater than zero"));
        }
        if !KNOWN_MODELS.contains(&self.embedding_model.as_str()) {
            return Err(invalid(
                "embedding_model",
                format!(
                    "unknown model `{}` (expected one of {})",
                    self.embedding_model,
                    KNOWN_MODELS.join(", ")
                ),
            ));
        }
        for (key, w) in [
            ("semantic_weight", self.semantic_weight),
            ("lexical_weight", self.lexical_weight),
        ] {
            if !(0.0..=1.0).contains(&w) {
                return Err(invalid(key, format!("{} is outside [0, 1]", w)));
            }
        }
        let sum = self.semantic_weight + self.lexical_weight;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(invalid(
                "semantic_weight",
                format!("weights must sum to 1 (got {})", sum),
            ));
        }
        Ok(())
    }

    pub fn weights(&self) -> ScoreWeights {
        ScoreWeights {
            semantic: self.semantic_weight,
            lexical: self.lexical_weight,
        }
    }

    pub fn tie_break(&self) -> TieBreak {
        if self.legacy_tie_break {
            TieBreak::InsertionOrder
        } else {
            TieBreak::DocumentPage
        }
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidSetting {
        key,
        reason: reason.into(),
    }
}
