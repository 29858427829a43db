//! One digest run: load pages, score them, pick the top pages, label them.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::descriptor::{resolve_document, Descriptor};
use crate::error::{NoContentError, PipelineError, Result};
use crate::output::{self, Digest, ExtractedSection, Metadata, SubsectionAnalysis};
use crate::page::{PageRecord, ScoredPage};
use crate::parser::extract_heading;
use crate::rank::diversity::{rank, RankedSelection};
use crate::rank::embed::{build_embedder, Embedder, HashingEmbedder};
use crate::rank::lexical::{LexicalFitter, TfidfFitter};
use crate::rank::queries::expand;
use crate::rank::scorer::RelevanceScorer;
use crate::source::{FileSource, PageSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loading,
    Scoring,
    Ranking,
    Extracting,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Loading => "loading",
            Stage::Scoring => "scoring",
            Stage::Ranking => "ranking",
            Stage::Extracting => "extracting",
            Stage::Done => "done",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed: Duration,
}

/// Walks the stages in order and records how long each took.
#[derive(Debug)]
pub struct StageTracker {
    current: Stage,
    entered: Instant,
    timings: Vec<StageTiming>,
}

impl StageTracker {
    fn new() -> Self {
        debug!(stage = Stage::Loading.as_str(), "enter");
        StageTracker {
            current: Stage::Loading,
            entered: Instant::now(),
            timings: Vec::new(),
        }
    }

    fn advance(&mut self, next: Stage) {
        let elapsed = self.entered.elapsed();
        debug!(
            from = self.current.as_str(),
            to = next.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            "stage transition"
        );
        self.timings.push(StageTiming {
            stage: self.current,
            elapsed,
        });
        self.current = next;
        self.entered = Instant::now();
    }

    pub fn timings(&self) -> &[StageTiming] {
        &self.timings
    }
}

/// Shared flag checked between documents. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct RunStats {
    pub documents: usize,
    pub documents_read: usize,
    pub pages_scored: usize,
    pub timings: Vec<StageTiming>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: PathBuf,
    pub digest: Digest,
    pub stats: RunStats,
}

type Clock = Box<dyn Fn() -> String + Send + Sync>;

pub struct Pipeline {
    settings: Settings,
    embedder: Box<dyn Embedder>,
    fitter: Box<dyn LexicalFitter>,
    source: Box<dyn PageSource>,
    clock: Clock,
    cancel: CancelToken,
}

impl Pipeline {
    /// Hashing embedder, TF-IDF lexical model, file-backed pages, local clock.
    pub fn new(settings: Settings) -> Self {
        Pipeline {
            embedder: Box::new(HashingEmbedder::new(settings.embedding_dimensions)),
            fitter: Box::new(TfidfFitter),
            source: Box::new(FileSource),
            clock: Box::new(output::local_timestamp),
            cancel: CancelToken::new(),
            settings,
        }
    }

    /// Like [`new`](Self::new), with the embedder named by
    /// `settings.embedding_model`.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let embedder = build_embedder(
            &settings.embedding_model,
            settings.embedding_dimensions,
            settings.model_cache_dir.as_deref().map(Path::new),
        )?;
        info!(embedder = embedder.name(), "embedder selected");
        Ok(Self::new(settings).with_embedder(embedder))
    }

    pub fn with_embedder(mut self, embedder: Box<dyn Embedder>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn with_fitter(mut self, fitter: Box<dyn LexicalFitter>) -> Self {
        self.fitter = fitter;
        self
    }

    pub fn with_source(mut self, source: Box<dyn PageSource>) -> Self {
        self.source = source;
        self
    }

    /// Replace the timestamp source, e.g. to pin it for reproducible output.
    pub fn with_clock(mut self, clock: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Read `input.json` from `input_dir`, build the digest, write
    /// `output.json` into `output_dir`. Nothing is written on error.
    pub fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<RunReport> {
        let descriptor = Descriptor::load(input_dir)?;
        let (digest, stats) = self.build_digest(input_dir, &descriptor)?;
        let output_path = output::write_digest(output_dir, &digest)?;
        info!(path = %output_path.display(), "digest written");
        Ok(RunReport {
            output_path,
            digest,
            stats,
        })
    }

    pub fn build_digest(&self, input_dir: &Path, descriptor: &Descriptor) -> Result<(Digest, RunStats)> {
        let deadline = self.settings.deadline().map(|d| Instant::now() + d);
        let mut tracker = StageTracker::new();

        info!(
            documents = descriptor.documents.len(),
            persona = %descriptor.persona,
            "loading documents"
        );
        let per_document: Vec<Option<Vec<PageRecord>>> = descriptor
            .documents
            .par_iter()
            .zip(descriptor.titles.par_iter())
            .map(|(name, title)| self.load_document(input_dir, name, title.as_deref(), deadline))
            .collect::<Result<_>>()?;

        let loaded: Vec<Vec<PageRecord>> = per_document.into_iter().flatten().collect();
        if loaded.is_empty() {
            return Err(NoContentError {
                documents: descriptor.documents.len(),
            }
            .into());
        }
        let documents_read = loaded.len();

        tracker.advance(Stage::Scoring);
        let scored = self.score(descriptor, loaded, deadline)?;
        let pages_scored = scored.len();

        tracker.advance(Stage::Ranking);
        let selection = rank(scored, self.settings.top_k, self.settings.tie_break())?;
        info!(
            selected = selection.len(),
            top_k = self.settings.top_k,
            "ranked pages"
        );

        tracker.advance(Stage::Extracting);
        let digest = self.assemble(descriptor, &selection);

        tracker.advance(Stage::Done);
        let stats = RunStats {
            documents: descriptor.documents.len(),
            documents_read,
            pages_scored,
            timings: tracker.timings().to_vec(),
        };
        Ok((digest, stats))
    }

    /// `Ok(None)` when the document is skipped.
    fn load_document(
        &self,
        input_dir: &Path,
        name: &str,
        title: Option<&str>,
        deadline: Option<Instant>,
    ) -> Result<Option<Vec<PageRecord>>> {
        self.check_cancelled(Stage::Loading, deadline)?;

        let Some(path) = resolve_document(input_dir, name) else {
            warn!(document = name, "document not found, skipping");
            return Ok(None);
        };
        let pages = match self.source.pages(&path) {
            Ok(pages) => pages,
            Err(e) => {
                warn!(document = name, error = %e, "document unreadable, skipping");
                return Ok(None);
            }
        };

        let total = pages.len();
        let records: Vec<PageRecord> = pages
            .into_iter()
            .filter_map(|(n, text)| PageRecord::new(name, n, text, self.settings.min_page_chars))
            .collect();
        if records.is_empty() {
            warn!(document = name, pages = total, "no usable pages, skipping");
            return Ok(None);
        }

        debug!(
            document = name,
            title = title.unwrap_or(""),
            pages = total,
            kept = records.len(),
            "loaded"
        );
        Ok(Some(records))
    }

    fn score(
        &self,
        descriptor: &Descriptor,
        documents: Vec<Vec<PageRecord>>,
        deadline: Option<Instant>,
    ) -> Result<Vec<ScoredPage>> {
        let queries = expand(&descriptor.persona, &descriptor.job);
        let scorer = RelevanceScorer::new(
            &queries,
            self.embedder.as_ref(),
            self.fitter.as_ref(),
            self.settings.weights(),
        )?;
        debug!(
            embedder = self.embedder.name(),
            dimensions = scorer.dimensions(),
            queries = queries.len(),
            "scorer ready"
        );

        let pb = self.progress_bar(documents.len());
        let mut scored = Vec::new();
        for pages in documents {
            self.check_cancelled(Stage::Scoring, deadline)?;
            let document = pages.first().map(|p| p.document_id().to_string()).unwrap_or_default();
            pb.set_message(document.clone());
            let batch = scorer.score_pages(pages)?;
            debug!(document = %document, pages = batch.len(), "scored");
            scored.extend(batch);
            pb.inc(1);
        }
        pb.finish_and_clear();

        Ok(scored)
    }

    fn assemble(&self, descriptor: &Descriptor, selection: &RankedSelection) -> Digest {
        let mut extracted_sections = Vec::with_capacity(selection.len());
        let mut subsection_analysis = Vec::with_capacity(selection.len());

        for (i, entry) in selection.iter().enumerate() {
            let page = entry.page();
            extracted_sections.push(ExtractedSection {
                document: page.document_id().to_string(),
                section_title: extract_heading(page.raw_text()),
                importance_rank: i + 1,
                page_number: page.page_number(),
            });
            subsection_analysis.push(SubsectionAnalysis {
                document: page.document_id().to_string(),
                refined_text: page.normalized_text().to_string(),
                page_number: page.page_number(),
            });
        }

        Digest {
            metadata: Metadata {
                input_documents: descriptor.documents.clone(),
                persona: descriptor.persona.clone(),
                job_to_be_done: descriptor.job.clone(),
                processing_timestamp: (self.clock)(),
            },
            extracted_sections,
            subsection_analysis,
        }
    }

    fn check_cancelled(&self, stage: Stage, deadline: Option<Instant>) -> Result<()> {
        let expired = deadline.is_some_and(|d| Instant::now() >= d);
        if self.cancel.is_cancelled() || expired {
            warn!(stage = stage.as_str(), expired, "run cancelled");
            return Err(PipelineError::Cancelled {
                stage: stage.as_str(),
            });
        }
        Ok(())
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.settings.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}
