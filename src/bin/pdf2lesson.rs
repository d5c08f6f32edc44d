//! CLI binary for pdf2lesson.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `LessonConfig` / `PaperConfig` and prints the paths written.

use anyhow::{Context, Result};
use clap::builder::TypedValueParser;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2lesson::pipeline::generate::resolve_generator;
use pdf2lesson::{
    fetch_paper, plan_next_chapter, run_next_chapter, ChapterUnit, DirectoryIndexer, LessonConfig,
    LessonError, LessonProgressCallback, LessonRecord, PaperConfig, ProgressCallback, RunOutcome,
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
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that follows the run from planning to the index update.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Planning");
        bar.set_message("Reading lessons directory…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl LessonProgressCallback for CliProgressCallback {
    fn on_chapter_planned(&self, unit: &ChapterUnit, total_pages: usize) {
        self.bar.set_prefix(format!("Chapter {}", unit.number));
        self.bar.set_message(format!(
            "extracting pages {}–{} of {}",
            unit.start_page + 1,
            unit.end_page,
            total_pages
        ));
    }

    fn on_text_extracted(&self, chapter: u32, chars: usize) {
        self.bar.println(format!(
            "  {} Chapter {chapter}: {}",
            green("✓"),
            dim(&format!("{chars} chars extracted"))
        ));
    }

    fn on_generation_start(&self, _chapter: u32) {
        self.bar.set_message("waiting for explanation…");
    }

    fn on_lesson_written(&self, _record: &LessonRecord) {
        self.bar.finish_and_clear();
    }

    fn on_idle(&self, _chapter: u32) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Produce the next chapter (run it from a scheduler, once per day)
  pdf2lesson next

  # Custom book and span
  pdf2lesson next --source-pdf books/algebra.pdf --page-span 8

  # Use another LLM provider through edgequake-llm
  pdf2lesson next --provider openai --model gpt-4.1-mini

  # What would the next run do? (no API key needed)
  pdf2lesson plan

  # Regenerate classes/index.json and papers/index.json
  pdf2lesson index

  # Ask for one new paper summary
  pdf2lesson fetch-paper --topic "Federated learning for wearables"

LESSON LAYOUT:
  lessons/chapter<N>.md          rendered lesson
  lessons/chapter<N>_graph.png   placeholder figure
  lessons/original/chapter<N>.txt  raw chapter text
  lessons/index.json             [{name, title, path, original}, ...]

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Gemini API key (required unless --provider is set)
  OPENAI_API_KEY, ...     Keys for --provider routes
  PDFIUM_LIB_PATH         Path to libpdfium
  RUST_LOG                Override log filter

EXIT STATUS:
  0  a chapter was produced, or there is nothing left to extract
  1  any failure; the message names the failing stage
"#;

/// Turn a textbook PDF into beginner-friendly lessons, one chapter per run.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2lesson",
    version,
    about = "Turn a textbook PDF into beginner-friendly lessons, one chapter per run",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2LESSON_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and result paths.
    #[arg(short, long, global = true, env = "PDF2LESSON_QUIET")]
    quiet: bool,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "PDF2LESSON_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Produce the next chapter's lesson.
    Next(NextArgs),
    /// Show the next chapter and its page range without generating anything.
    Plan(SourceArgs),
    /// Regenerate the classes and papers file indexes.
    Index(IndexArgs),
    /// Ask the model for one new paper summary and save it.
    FetchPaper(FetchPaperArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Source textbook PDF.
    #[arg(
        long,
        env = "PDF2LESSON_SOURCE_PDF",
        default_value = "lessons/introduction-to-classical-and-quantum-computing.pdf"
    )]
    source_pdf: PathBuf,

    /// Directory holding lessons and index.json.
    #[arg(long, env = "PDF2LESSON_LESSONS_DIR", default_value = "lessons")]
    lessons_dir: PathBuf,

    /// Pages per chapter.
    #[arg(long, env = "PDF2LESSON_PAGE_SPAN", default_value_t = pdf2lesson::DEFAULT_PAGE_SPAN,
          value_parser = clap::value_parser!(u64).range(1..).map(|v| v as usize))]
    page_span: usize,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2LESSON_PASSWORD")]
    password: Option<String>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct GeneratorArgs {
    /// Model ID.
    #[arg(long, env = "PDF2LESSON_MODEL", default_value = pdf2lesson::config::DEFAULT_MODEL)]
    model: String,

    /// edgequake-llm provider (openai, anthropic, ollama, ...) instead of direct Gemini.
    #[arg(long, env = "PDF2LESSON_PROVIDER")]
    provider: Option<String>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini API base URL.
    #[arg(long, env = "PDF2LESSON_ENDPOINT")]
    endpoint: Option<String>,

    /// Generation request timeout in seconds.
    #[arg(long, env = "PDF2LESSON_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Temperature for --provider routes (0.0–2.0).
    #[arg(long, env = "PDF2LESSON_TEMPERATURE", default_value_t = 0.4)]
    temperature: f32,

    /// Max output tokens for --provider routes.
    #[arg(long, env = "PDF2LESSON_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,
}

#[derive(Args, Debug)]
struct NextArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    generator: GeneratorArgs,

    /// Subtitle in every lesson heading.
    #[arg(long, env = "PDF2LESSON_SUBTITLE", default_value = "Quantum for Dummies")]
    subtitle: String,

    /// Text file with a custom prompt; must contain {chapter_text}.
    #[arg(long, env = "PDF2LESSON_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct IndexArgs {
    /// Course material directory.
    #[arg(long, env = "PDF2LESSON_CLASSES_DIR", default_value = "classes")]
    classes_dir: PathBuf,

    /// Paper summaries directory.
    #[arg(long, env = "PDF2LESSON_PAPERS_DIR", default_value = "papers")]
    papers_dir: PathBuf,
}

#[derive(Args, Debug)]
struct FetchPaperArgs {
    /// Paper summaries directory.
    #[arg(long, env = "PDF2LESSON_PAPERS_DIR", default_value = "papers")]
    papers_dir: PathBuf,

    /// Research topic.
    #[arg(long, env = "PDF2LESSON_TOPIC", default_value = pdf2lesson::prompts::DEFAULT_PAPER_TOPIC)]
    topic: String,

    #[command(flatten)]
    generator: GeneratorArgs,
}

/// Prefix a library error with the stage that failed.
fn staged(e: LessonError) -> anyhow::Error {
    anyhow::anyhow!("{} failed: {}", e.stage(), e)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = shows_progress(&cli);
    let filter = log_filter(&cli);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Next(ref args) => cmd_next(args, show_progress && !cli.verbose, cli.quiet).await,
        Command::Plan(ref args) => cmd_plan(args).await,
        Command::Index(ref args) => cmd_index(args, cli.quiet),
        Command::FetchPaper(ref args) => cmd_fetch_paper(args).await,
    }
}

fn shows_progress(cli: &Cli) -> bool {
    !cli.quiet && !cli.no_progress && !wants_json(&cli.command)
}

/// Default log level when `RUST_LOG` is unset.
///
/// The spinner keeps INFO milestones out of its way, but warnings about
/// recovered conditions (a reset index, a replaced record) always show.
fn log_filter(cli: &Cli) -> &'static str {
    if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if shows_progress(cli) {
        "warn"
    } else {
        "info"
    }
}

fn wants_json(command: &Command) -> bool {
    match command {
        Command::Next(args) => args.source.json,
        Command::Plan(args) => args.json,
        _ => false,
    }
}

async fn cmd_next(args: &NextArgs, show_progress: bool, quiet: bool) -> Result<()> {
    let config = build_lesson_config(args).await?;

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as ProgressCallback)
    } else {
        None
    };

    let outcome = run_next_chapter(&config, progress).await.map_err(staged)?;

    match outcome {
        RunOutcome::Idle { next_chapter } => {
            if args.source.json {
                println!("{}", serde_json::json!({ "idle": true, "next_chapter": next_chapter }));
            } else {
                println!("No more chapters to extract.");
            }
        }
        RunOutcome::Produced(lesson) => {
            if args.source.json {
                let json = serde_json::json!({
                    "chapter": lesson.unit,
                    "record": lesson.record,
                    "graph": lesson.graph_path,
                    "index": lesson.index_path,
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json).context("Failed to serialise output")?
                );
            } else {
                println!("Added lesson: {}", lesson.record.path);
                println!("Original text: {}", lesson.record.original);
                println!("Graph: {}", lesson.graph_path.display());
                if !quiet {
                    eprintln!(
                        "{}  {}  pages {}–{}  {}ms  →  {} ({} lessons)",
                        green("✔"),
                        bold(&lesson.record.title),
                        lesson.unit.start_page + 1,
                        lesson.unit.end_page,
                        lesson.duration_ms,
                        lesson.index_path.display(),
                        lesson.index_len,
                    );
                }
            }
        }
    }
    Ok(())
}

async fn cmd_plan(args: &SourceArgs) -> Result<()> {
    let mut builder = LessonConfig::builder()
        .source_pdf(&args.source_pdf)
        .lessons_dir(&args.lessons_dir)
        .page_span(args.page_span);
    if let Some(ref pwd) = args.password {
        builder = builder.password(pwd);
    }
    let config = builder.build().context("Invalid configuration")?;

    let plan = plan_next_chapter(&config).await.map_err(staged)?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&plan).context("Failed to serialise plan")?
        );
    } else if plan.is_exhausted() {
        println!(
            "Chapter {} would start at page {} but the document has {} pages: nothing left.",
            plan.unit.number,
            plan.unit.start_page + 1,
            plan.total_pages
        );
    } else {
        println!(
            "Next: chapter {}, pages {}–{} of {}",
            plan.unit.number,
            plan.unit.start_page + 1,
            plan.unit.end_page,
            plan.total_pages
        );
    }
    Ok(())
}

fn cmd_index(args: &IndexArgs, quiet: bool) -> Result<()> {
    for indexer in [
        DirectoryIndexer::classes(&args.classes_dir),
        DirectoryIndexer::papers(&args.papers_dir),
    ] {
        let out = indexer.default_output();
        let entries = indexer.write_index(&out).map_err(staged)?;
        if !quiet {
            println!("Generated {} with {} files.", out.display(), entries.len());
        }
    }
    Ok(())
}

async fn cmd_fetch_paper(args: &FetchPaperArgs) -> Result<()> {
    let config = generator_config(&args.generator, LessonConfig::builder())?;
    let generator = resolve_generator(&config).map_err(staged)?;

    let paper_config = PaperConfig {
        papers_dir: args.papers_dir.clone(),
        topic: args.topic.clone(),
    };
    let today = chrono::Local::now().date_naive();

    let path = fetch_paper(generator.as_ref(), &paper_config, today)
        .await
        .map_err(staged)?;
    println!("Saved paper to {}", path.display());
    Ok(())
}

/// Map CLI args to `LessonConfig`.
async fn build_lesson_config(args: &NextArgs) -> Result<LessonConfig> {
    let mut builder = LessonConfig::builder()
        .source_pdf(&args.source.source_pdf)
        .lessons_dir(&args.source.lessons_dir)
        .page_span(args.source.page_span)
        .subtitle(&args.subtitle);

    if let Some(ref path) = args.prompt_file {
        let template = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt template from {:?}", path))?;
        builder = builder.prompt_template(template);
    }
    if let Some(ref pwd) = args.source.password {
        builder = builder.password(pwd);
    }

    generator_config(&args.generator, builder)
}

fn generator_config(
    args: &GeneratorArgs,
    builder: pdf2lesson::LessonConfigBuilder,
) -> Result<LessonConfig> {
    let mut builder = builder
        .model(&args.model)
        .api_key(args.api_key.clone())
        .request_timeout_secs(args.timeout)
        .temperature(args.temperature)
        .max_tokens(args.max_tokens);

    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref endpoint) = args.endpoint {
        builder = builder.endpoint(endpoint);
    }

    builder.build().context("Invalid configuration")
}
