//! Pipeline entry points: advance the lesson series by one chapter.
//!
//! Each run does exactly one unit of work:
//!
//! ```text
//! plan ──▶ extract ──▶ (blank? → Idle) ──▶ generate ──▶ write ──▶ index
//! ```
//!
//! The run either completes the whole chapter or fails. On any failure
//! before the index update, `index.json` is untouched; a crash between the
//! artifact writes and the index rewrite leaves orphan artifacts that the
//! next run counts as a finished chapter.
//!
//! There is no locking. Two runs in flight at once can both read the same
//! index and the later rewrite drops the other's record; run one at a time.

use crate::config::LessonConfig;
use crate::error::LessonError;
use crate::index::{IndexStore, LessonRecord};
use crate::pipeline::extract::{self, is_blank, PageSource, PdfiumSource};
use crate::pipeline::generate::{resolve_generator, ExplanationGenerator};
use crate::pipeline::planner::{ChapterPlanner, ChapterUnit};
use crate::pipeline::writer::{LessonLayout, LessonWriter};
use crate::progress::ProgressCallback;
use crate::prompts::explain_prompt;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The next chapter's page range holds no text. Nothing was written.
    Idle { next_chapter: u32 },
    /// A chapter was produced.
    Produced(ProducedLesson),
}

impl RunOutcome {
    pub fn is_idle(&self) -> bool {
        matches!(self, RunOutcome::Idle { .. })
    }
}

/// Everything a successful run wrote.
#[derive(Debug, Clone)]
pub struct ProducedLesson {
    pub unit: ChapterUnit,
    pub record: LessonRecord,
    pub graph_path: PathBuf,
    pub index_path: PathBuf,
    /// Index length after the update.
    pub index_len: usize,
    pub duration_ms: u64,
}

/// Read-only answer to "what would the next run do?".
#[derive(Debug, Clone, Serialize)]
pub struct ChapterPlan {
    pub unit: ChapterUnit,
    pub total_pages: usize,
}

impl ChapterPlan {
    /// Whether the next run will find nothing to do.
    pub fn is_exhausted(&self) -> bool {
        self.unit.is_empty()
    }
}

/// The chapter pipeline with its collaborators injected.
pub struct LessonPipeline {
    planner: ChapterPlanner,
    writer: LessonWriter,
    index: IndexStore,
    prompt_template: String,
    source: Arc<dyn PageSource>,
    generator: Arc<dyn ExplanationGenerator>,
    progress: Option<ProgressCallback>,
}

impl LessonPipeline {
    pub fn new(
        config: &LessonConfig,
        source: Arc<dyn PageSource>,
        generator: Arc<dyn ExplanationGenerator>,
    ) -> Self {
        let layout = LessonLayout::new(&config.lessons_dir);
        Self {
            planner: ChapterPlanner::new(&config.lessons_dir, config.page_span),
            index: IndexStore::new(layout.index()),
            writer: LessonWriter::new(layout, config.subtitle.clone()),
            prompt_template: config.prompt_template.clone(),
            source,
            generator,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Plan the next chapter against the source document.
    pub async fn plan(&self) -> Result<ChapterPlan, LessonError> {
        let total_pages = extract::page_count(&self.source).await?;
        let unit = self.planner.next_unit(total_pages)?;
        Ok(ChapterPlan { unit, total_pages })
    }

    /// Produce the next chapter, or report that there is none.
    pub async fn run_once(&self) -> Result<RunOutcome, LessonError> {
        let start = Instant::now();

        // ── Step 1: Plan ─────────────────────────────────────────────────
        let ChapterPlan { unit, total_pages } = self.plan().await?;
        info!(
            "Chapter {}: pages {}..{} of {}",
            unit.number, unit.start_page, unit.end_page, total_pages
        );
        if let Some(ref cb) = self.progress {
            cb.on_chapter_planned(&unit, total_pages);
        }

        // ── Step 2: Extract ──────────────────────────────────────────────
        let raw_text = extract::extract_text(&self.source, unit.pages()).await?;
        if is_blank(&raw_text) {
            info!("No more chapters to extract");
            if let Some(ref cb) = self.progress {
                cb.on_idle(unit.number);
            }
            return Ok(RunOutcome::Idle {
                next_chapter: unit.number,
            });
        }
        debug!("Extracted {} chars", raw_text.len());
        if let Some(ref cb) = self.progress {
            cb.on_text_extracted(unit.number, raw_text.len());
        }

        // ── Step 3: Generate ─────────────────────────────────────────────
        if let Some(ref cb) = self.progress {
            cb.on_generation_start(unit.number);
        }
        let prompt = explain_prompt(&self.prompt_template, &raw_text);
        let explanation = self.generator.generate(&prompt).await?;

        // ── Step 4: Write artifacts ──────────────────────────────────────
        let record = self
            .writer
            .write(unit.number, &raw_text, &explanation)
            .await?;

        // ── Step 5: Update index ─────────────────────────────────────────
        let index_len = self.index.append(record.clone()).await?.len();
        if let Some(ref cb) = self.progress {
            cb.on_lesson_written(&record);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!("Added lesson {} in {}ms", record.path, duration_ms);

        Ok(RunOutcome::Produced(ProducedLesson {
            unit,
            graph_path: self.writer.layout().graph(unit.number),
            index_path: self.index.path().to_path_buf(),
            record,
            index_len,
            duration_ms,
        }))
    }
}

/// Run the pipeline once with the production collaborators.
///
/// The credential is checked before the source document is opened.
pub async fn run_next_chapter(
    config: &LessonConfig,
    progress: Option<ProgressCallback>,
) -> Result<RunOutcome, LessonError> {
    let generator = resolve_generator(config)?;
    let source: Arc<dyn PageSource> = Arc::new(PdfiumSource::open(
        &config.source_pdf,
        config.password.clone(),
    )?);

    let mut pipeline = LessonPipeline::new(config, source, generator);
    if let Some(cb) = progress {
        pipeline = pipeline.with_progress(cb);
    }
    pipeline.run_once().await
}

/// Report the next chapter without generating anything.
///
/// Needs no credential.
pub async fn plan_next_chapter(config: &LessonConfig) -> Result<ChapterPlan, LessonError> {
    let source: Arc<dyn PageSource> = Arc::new(PdfiumSource::open(
        &config.source_pdf,
        config.password.clone(),
    )?);
    let total_pages = extract::page_count(&source).await?;
    let unit = ChapterPlanner::new(&config.lessons_dir, config.page_span).next_unit(total_pages)?;
    Ok(ChapterPlan { unit, total_pages })
}
