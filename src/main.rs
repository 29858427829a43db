use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use persona_digest::config::{Settings, SETTINGS_FILE};
use persona_digest::output;
use persona_digest::parser::outline::build_outline;
use persona_digest::source::{FileSource, PageSource};
use persona_digest::{Pipeline, RunReport};

#[derive(Parser)]
#[command(
    name = "persona_digest",
    about = "Pick the pages that matter to a persona and a job to be done",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank pages and write output.json (default)
    Run(RunArgs),
    /// Write a heading outline of one document as <stem>.json
    Outline {
        /// PDF or text document
        file: PathBuf,
        /// Output directory (default: ./output or /app/output)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Args, Clone)]
struct RunArgs {
    /// Directory holding input.json and the documents (default: ./input or /app/input)
    #[arg(short, long)]
    input_dir: Option<PathBuf>,
    /// Directory for output.json (default: ./output or /app/output)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Number of pages to select, at most one per document
    #[arg(short = 'k', long)]
    top_k: Option<usize>,
    /// Settings file (default: persona_digest.toml in the input directory)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Fixed processing_timestamp, for reproducible output
    #[arg(long)]
    timestamp: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Run(args)) => run(args),
        Some(Commands::Outline { file, output_dir }) => outline(&file, output_dir),
        None => run(cli.run),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("Done in {}", format_duration(elapsed));
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let input_dir = args
        .input_dir
        .unwrap_or_else(|| default_dir("./input", "/app/input"));
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| default_dir("./output", "/app/output"));

    let settings = load_settings(&input_dir, args.config.as_deref(), args.top_k)?;
    info!(
        input = %input_dir.display(),
        output = %output_dir.display(),
        top_k = settings.top_k,
        "starting digest"
    );

    let mut pipeline = Pipeline::from_settings(settings).context("loading embedder")?;
    if let Some(ts) = args.timestamp {
        pipeline = pipeline.with_clock(move || ts.clone());
    }

    let report = pipeline
        .run(&input_dir, &output_dir)
        .with_context(|| format!("digest of {} failed", input_dir.display()))?;
    print_summary(&report);
    Ok(())
}

/// defaults → TOML file → `DIGEST_*` env → CLI flags.
fn load_settings(
    input_dir: &Path,
    config: Option<&Path>,
    top_k: Option<usize>,
) -> anyhow::Result<Settings> {
    let local = input_dir.join(SETTINGS_FILE);
    let file = match config {
        Some(path) => Some(path.to_path_buf()),
        None if local.is_file() => Some(local),
        None => None,
    };

    let mut settings = Settings::load(file.as_deref()).context("loading settings")?;
    if let Some(k) = top_k {
        settings.top_k = k;
    }
    settings.validate().context("validating settings")?;
    Ok(settings)
}

fn outline(file: &Path, output_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let output_dir = output_dir.unwrap_or_else(|| default_dir("./output", "/app/output"));
    let pages = FileSource.pages(file)?;
    let outline = build_outline(&pages);

    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .context("document has no file name")?;
    let path = output::write_outline(&output_dir, stem, &outline)?;
    println!(
        "{}: \"{}\", {} headings -> {}",
        file.display(),
        truncate(&outline.title, 40),
        outline.outline.len(),
        path.display()
    );
    Ok(())
}

/// `local` if it exists, else the container path.
fn default_dir(local: &str, container: &str) -> PathBuf {
    if Path::new(local).exists() {
        PathBuf::from(local)
    } else {
        PathBuf::from(container)
    }
}

fn print_summary(report: &RunReport) {
    let digest = &report.digest;
    println!(
        "{:>4} | {:<32} | {:>4} | {:<40}",
        "Rank", "Document", "Page", "Section"
    );
    println!("{}", "-".repeat(90));
    for s in &digest.extracted_sections {
        println!(
            "{:>4} | {:<32} | {:>4} | {:<40}",
            s.importance_rank,
            truncate(&s.document, 32),
            s.page_number,
            truncate(&s.section_title, 40)
        );
    }

    let stats = &report.stats;
    println!(
        "\n{} of {} documents read, {} pages scored -> {}",
        stats.documents_read,
        stats.documents,
        stats.pages_scored,
        report.output_path.display()
    );
    for t in &stats.timings {
        println!("  {:<10} {}", t.stage.as_str(), format_duration(t.elapsed));
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
