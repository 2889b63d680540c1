//! CLI binary for resume-review.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ReviewConfig`, shows pipeline status, and prints the stored record.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use resume_review::store::get_record;
use resume_review::{
    analyze_resume, FileRecordStore, JobContext, LocalStorage, NoopStatusObserver,
    PipelineStatus, RecordStore, ReviewConfig, StatusObserver, StorageClient, SubmissionId,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── CLI status observer using indicatif ──────────────────────────────────────

/// Spinner whose message is always the latest status line, verbatim.
/// Completed stages are echoed above the spinner as they finish.
struct CliStatusObserver {
    bar: ProgressBar,
}

impl CliStatusObserver {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }
}

impl StatusObserver for CliStatusObserver {
    fn on_status(&self, status: &PipelineStatus, message: &str) {
        match status {
            PipelineStatus::Completed => {
                self.bar.finish_and_clear();
                eprintln!("{} {}", green("✔"), message);
            }
            PipelineStatus::Failed { .. } => {
                self.bar.finish_and_clear();
                eprintln!("{} {}", red("✘"), red(message));
            }
            _ => {
                let prev = self.bar.message();
                if !prev.is_empty() {
                    self.bar.println(format!("  {} {}", green("✓"), dim(&prev)));
                }
                self.bar.set_message(message.to_string());
            }
        }
    }
}

/// Plain observer for `--no-progress`: one status line per stage on stderr.
struct LineStatusObserver;

impl StatusObserver for LineStatusObserver {
    fn on_status(&self, _status: &PipelineStatus, message: &str) {
        eprintln!("{message}");
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Review a resume for a role
  resume-review analyze cv.pdf --company Acme --job-title "Backend Engineer" \
      --job-description-file jd.txt

  # Review a resume hosted online with a specific model
  resume-review analyze https://example.com/cv.pdf --job-title Engineer \
      --provider anthropic --model claude-sonnet-4-20250514

  # Print a stored submission
  resume-review show 67e55044-10b1-426f-9247-bb680e5fe0c8

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter, e.g. resume_review=debug
"#;

/// Get ATS feedback on a resume from a vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "resume-review",
    version,
    about = "Get ATS feedback on a resume from a vision LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory for uploaded resumes and previews.
    #[arg(long, global = true, env = "RESUME_REVIEW_STORAGE_DIR", default_value = "data/files")]
    storage_dir: PathBuf,

    /// Directory for submission records.
    #[arg(long, global = true, env = "RESUME_REVIEW_RECORDS_DIR", default_value = "data/records")]
    records_dir: PathBuf,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "RESUME_REVIEW_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the final record.
    #[arg(short, long, global = true, env = "RESUME_REVIEW_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a resume, render its preview, and store the review.
    Analyze(AnalyzeArgs),
    /// Print a stored submission record as JSON.
    Show {
        /// Submission id (with or without the `resume:` prefix).
        id: String,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Local resume PDF or HTTP/HTTPS URL.
    input: String,

    /// Company the candidate is applying to.
    #[arg(long, default_value = "")]
    company: String,

    /// Title of the target job.
    #[arg(long, default_value = "")]
    job_title: String,

    /// Target job description text.
    #[arg(long, default_value = "", conflicts_with = "job_description_file")]
    job_description: String,

    /// Read the job description from a file.
    #[arg(long)]
    job_description_file: Option<PathBuf>,

    /// LLM model ID (e.g. gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Longest edge of the preview image in pixels.
    #[arg(long, env = "RESUME_REVIEW_PREVIEW_PIXELS", default_value_t = 1200)]
    preview_pixels: u32,

    /// Leading pages shown to the reviewer.
    #[arg(long, env = "RESUME_REVIEW_PAGES", default_value_t = 2)]
    review_pages: usize,

    /// Longest edge of each page image sent to the reviewer.
    #[arg(long, env = "RESUME_REVIEW_PIXELS", default_value_t = 2000)]
    review_pixels: u32,

    /// Max LLM output tokens.
    #[arg(long, env = "RESUME_REVIEW_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "RESUME_REVIEW_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Path to a text file containing a custom reviewer system prompt.
    #[arg(long, env = "RESUME_REVIEW_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Reviewer call timeout in seconds.
    #[arg(long, env = "RESUME_REVIEW_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "RESUME_REVIEW_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Path to libpdfium (file or containing directory).
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Disable the spinner; print one line per stage instead.
    #[arg(long, env = "RESUME_REVIEW_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let records: Arc<dyn RecordStore> = Arc::new(FileRecordStore::new(&cli.records_dir));

    match &cli.command {
        Command::Show { id } => {
            let id: SubmissionId = id
                .parse()
                .with_context(|| format!("'{id}' is not a submission id"))?;
            let record = get_record(records.as_ref(), &id.record_key())
                .await
                .context("Failed to read record")?
                .with_context(|| format!("No submission stored for {id}"))?;
            println!(
                "{}",
                serde_json::to_string_pretty(&record).context("Failed to serialise record")?
            );
            Ok(())
        }
        Command::Analyze(args) => run_analyze(&cli, args, records).await,
    }
}

async fn run_analyze(cli: &Cli, args: &AnalyzeArgs, records: Arc<dyn RecordStore>) -> Result<()> {
    let config = build_config(args).await?;

    let job_description = match args.job_description_file {
        Some(ref path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read job description from {:?}", path))?,
        None => args.job_description.clone(),
    };
    let job = JobContext {
        company_name: args.company.clone(),
        job_title: args.job_title.clone(),
        job_description,
    };

    let storage: Arc<dyn StorageClient> = Arc::new(LocalStorage::new(&cli.storage_dir));

    let observer: Box<dyn StatusObserver> = if cli.quiet {
        Box::new(NoopStatusObserver)
    } else if args.no_progress {
        Box::new(LineStatusObserver)
    } else {
        Box::new(CliStatusObserver::new())
    };

    let outcome = analyze_resume(
        &args.input,
        job,
        &config,
        storage,
        records,
        observer.as_ref(),
    )
    .await
    .context("Could not start the review")?;

    match outcome {
        Ok(record) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&record).context("Failed to serialise record")?
            );
            Ok(())
        }
        // The observer already printed the status line.
        Err(failure) => Err(anyhow::Error::new(failure)),
    }
}

/// Map CLI args to `ReviewConfig`.
async fn build_config(args: &AnalyzeArgs) -> Result<ReviewConfig> {
    let mut builder = ReviewConfig::builder()
        .max_preview_pixels(args.preview_pixels)
        .review_pages(args.review_pages)
        .review_pixels(args.review_pixels)
        .max_tokens(args.max_tokens)
        .temperature(args.temperature)
        .api_timeout_secs(args.api_timeout)
        .download_timeout_secs(args.download_timeout);

    if let Some(ref path) = args.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref model) = args.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref lib) = args.pdfium_lib {
        builder = builder.pdfium_lib_path(lib.clone());
    }

    builder.build().context("Invalid configuration")
}
