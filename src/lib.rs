//! Persona-driven page selection over a small document collection.
//!
//! Pages are scored against a persona and job-to-be-done, the best page of
//! each document competes for the top K slots, and every selected page is
//! labelled with a heading guessed from its text.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod output;
pub mod page;
pub mod parser;
pub mod pipeline;
pub mod rank;
pub mod source;

pub use config::Settings;
pub use error::{PipelineError, Result};
pub use pipeline::{CancelToken, Pipeline, RunReport};
