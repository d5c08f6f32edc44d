//! # pdf2lesson
//!
//! Turn a textbook PDF into a series of beginner-friendly Markdown lessons,
//! one chapter per run, and keep JSON indexes of the course directories.
//!
//! ## Pipeline Overview
//!
//! ```text
//! lessons/ listing ──▶ next chapter N, pages (N-1)*span .. N*span
//!                          │
//!  PDF ──▶ page text ──────┤ blank? → idle, nothing written
//!                          │
//!                          ├─ LLM explanation (Gemini or any edgequake-llm provider)
//!                          ├─ lessons/chapterN.md, chapterN_graph.png, original/chapterN.txt
//!                          └─ lessons/index.json (+1 record)
//! ```
//!
//! There is no stored counter: the number of `chapterN.md` files is the
//! state, so a scheduled job can simply run the pipeline again and again.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2lesson::{run_next_chapter, LessonConfig, RunOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LessonConfig::builder()
//!         .source_pdf("lessons/book.pdf")
//!         .api_key(std::env::var("GEMINI_API_KEY").ok())
//!         .build()?;
//!     match run_next_chapter(&config, None).await? {
//!         RunOutcome::Idle { .. } => println!("No more chapters to extract."),
//!         RunOutcome::Produced(lesson) => println!("Added lesson: {}", lesson.record.path),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2lesson` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod index;
pub mod indexer;
pub mod papers;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{LessonConfig, LessonConfigBuilder, PaperConfig, DEFAULT_PAGE_SPAN};
pub use error::LessonError;
pub use index::{IndexStore, LessonRecord};
pub use indexer::{DirectoryIndexer, FileIndexEntry, FileKind};
pub use papers::fetch_paper;
pub use pipeline::extract::{PageSource, PdfiumSource};
pub use pipeline::generate::{
    ChatCompletion, ExplanationGenerator, GeminiGenerator, ProviderGenerator,
};
pub use pipeline::planner::{count_existing_chapters, ChapterPlanner, ChapterUnit};
pub use pipeline::writer::{LessonLayout, LessonWriter};
pub use progress::{LessonProgressCallback, NoopProgressCallback, ProgressCallback};
pub use run::{plan_next_chapter, run_next_chapter, ChapterPlan, LessonPipeline, ProducedLesson, RunOutcome};
