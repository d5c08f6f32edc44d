//! Pipeline integration tests with in-memory collaborators.
//!
//! No pdfium and no network: the document is a `Vec<String>` of page texts
//! and the generator echoes a canned explanation while recording prompts.

use async_trait::async_trait;
use pdf2lesson::{
    ExplanationGenerator, IndexStore, LessonConfig, LessonError, LessonPipeline,
    LessonProgressCallback, LessonRecord, PageSource, RunOutcome,
};
use std::ops::Range;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Fakes ────────────────────────────────────────────────────────────────────

struct MemoryPages(Vec<String>);

impl MemoryPages {
    fn numbered(count: usize) -> Arc<Self> {
        Arc::new(Self((0..count).map(|i| format!("page {i} text")).collect()))
    }
}

impl PageSource for MemoryPages {
    fn page_count(&self) -> Result<usize, LessonError> {
        Ok(self.0.len())
    }

    fn page_texts(&self, range: Range<usize>) -> Result<Vec<String>, LessonError> {
        Ok(self.0[range].to_vec())
    }
}

#[derive(Default)]
struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingGenerator {
    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ExplanationGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LessonError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(LessonError::ServiceStatus {
                status: 503,
                body: "overloaded".into(),
            });
        }
        Ok(format!("Explained ({} chars in).", prompt.len()))
    }
}

#[derive(Default)]
struct CountingProgress {
    planned: AtomicUsize,
    written: AtomicUsize,
    idle: AtomicUsize,
}

impl LessonProgressCallback for CountingProgress {
    fn on_chapter_planned(&self, _unit: &pdf2lesson::ChapterUnit, _total_pages: usize) {
        self.planned.fetch_add(1, Ordering::SeqCst);
    }
    fn on_lesson_written(&self, _record: &LessonRecord) {
        self.written.fetch_add(1, Ordering::SeqCst);
    }
    fn on_idle(&self, _chapter: u32) {
        self.idle.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn config(lessons: &Path) -> LessonConfig {
    LessonConfig::builder()
        .lessons_dir(lessons)
        .page_span(5)
        .build()
        .unwrap()
}

fn pipeline(
    lessons: &Path,
    pages: Arc<MemoryPages>,
    generator: Arc<RecordingGenerator>,
) -> LessonPipeline {
    LessonPipeline::new(&config(lessons), pages, generator)
}

fn produced(outcome: RunOutcome) -> pdf2lesson::ProducedLesson {
    match outcome {
        RunOutcome::Produced(lesson) => lesson,
        RunOutcome::Idle { next_chapter } => panic!("unexpected idle at chapter {next_chapter}"),
    }
}

fn snapshot(lessons: &Path, n: u32) -> String {
    std::fs::read_to_string(lessons.join(format!("original/chapter{n}.txt"))).unwrap()
}

fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .map(|e| e.path().display().to_string())
        .collect();
    names.sort();
    names
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn twelve_pages_yield_three_chapters_then_idle() {
    let tmp = TempDir::new().unwrap();
    let lessons = tmp.path().join("lessons");
    let generator = Arc::new(RecordingGenerator::default());
    let pipeline = pipeline(&lessons, MemoryPages::numbered(12), generator.clone());

    let first = produced(pipeline.run_once().await.unwrap());
    assert_eq!(first.unit.number, 1);
    assert_eq!(first.unit.pages(), 0..5);
    assert_eq!(
        snapshot(&lessons, 1),
        "page 0 text\npage 1 text\npage 2 text\npage 3 text\npage 4 text\n"
    );

    let second = produced(pipeline.run_once().await.unwrap());
    assert_eq!(second.unit.number, 2);
    assert_eq!(second.unit.pages(), 5..10);

    let third = produced(pipeline.run_once().await.unwrap());
    assert_eq!(third.unit.number, 3);
    assert_eq!(third.unit.pages(), 10..12);
    assert_eq!(snapshot(&lessons, 3), "page 10 text\npage 11 text\n");

    let fourth = pipeline.run_once().await.unwrap();
    assert!(matches!(fourth, RunOutcome::Idle { next_chapter: 4 }));
    assert_eq!(generator.calls(), 3);

    let index = IndexStore::new(lessons.join("index.json")).load();
    let names: Vec<_> = index.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["chapter1.md", "chapter2.md", "chapter3.md"]);
}

#[tokio::test]
async fn produced_lesson_has_heading_and_explanation() {
    let tmp = TempDir::new().unwrap();
    let lessons = tmp.path().join("lessons");
    let generator = Arc::new(RecordingGenerator::default());
    let pipeline = pipeline(&lessons, MemoryPages::numbered(3), generator.clone());

    let lesson = produced(pipeline.run_once().await.unwrap());

    let md = std::fs::read_to_string(lessons.join("chapter1.md")).unwrap();
    assert!(md.starts_with("# Chapter 1: Quantum for Dummies\n\nExplained ("));
    assert!(md.ends_with(".\n"));

    let png = std::fs::read(&lesson.graph_path).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    // The prompt carries the raw chapter text.
    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("page 0 text\npage 1 text\npage 2 text\n"));

    assert_eq!(lesson.record.title, "Chapter 1: Quantum for Dummies");
    assert!(lesson.record.path.ends_with("lessons/chapter1.md"));
    assert!(lesson.record.original.ends_with("lessons/original/chapter1.txt"));
    assert_eq!(lesson.index_len, 1);
}

#[tokio::test]
async fn each_run_appends_exactly_one_record() {
    let tmp = TempDir::new().unwrap();
    let lessons = tmp.path().join("lessons");
    let pipeline = pipeline(
        &lessons,
        MemoryPages::numbered(20),
        Arc::new(RecordingGenerator::default()),
    );
    let store = IndexStore::new(lessons.join("index.json"));

    for n in 1..=4u32 {
        let before = store.load();
        let lesson = produced(pipeline.run_once().await.unwrap());
        let after = store.load();
        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after[..before.len()], before[..]);
        assert_eq!(after.last().unwrap().name, format!("chapter{n}.md"));
        assert_eq!(after.last().unwrap(), &lesson.record);
    }
}

#[tokio::test]
async fn idle_run_changes_nothing() {
    let tmp = TempDir::new().unwrap();
    let lessons = tmp.path().join("lessons");
    let generator = Arc::new(RecordingGenerator::default());
    let pipeline = pipeline(&lessons, MemoryPages::numbered(5), generator.clone());

    produced(pipeline.run_once().await.unwrap());
    let index_before = std::fs::read(lessons.join("index.json")).unwrap();
    let tree_before = dir_listing(&lessons);

    for _ in 0..2 {
        let outcome = pipeline.run_once().await.unwrap();
        assert!(outcome.is_idle());
    }

    assert_eq!(std::fs::read(lessons.join("index.json")).unwrap(), index_before);
    assert_eq!(dir_listing(&lessons), tree_before);
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn whitespace_only_pages_count_as_exhausted() {
    let tmp = TempDir::new().unwrap();
    let lessons = tmp.path().join("lessons");
    let pages = Arc::new(MemoryPages(vec!["  ".into(), "\n\t".into()]));
    let generator = Arc::new(RecordingGenerator::default());
    let pipeline = pipeline(&lessons, pages, generator.clone());

    let outcome = pipeline.run_once().await.unwrap();
    assert!(matches!(outcome, RunOutcome::Idle { next_chapter: 1 }));
    assert_eq!(generator.calls(), 0);
    assert!(!lessons.exists());
}

#[tokio::test]
async fn generator_failure_leaves_no_artifacts() {
    let tmp = TempDir::new().unwrap();
    let lessons = tmp.path().join("lessons");
    let pipeline = pipeline(&lessons, MemoryPages::numbered(12), RecordingGenerator::failing());

    let err = pipeline.run_once().await.unwrap_err();
    assert!(matches!(err, LessonError::ServiceStatus { status: 503, .. }));
    assert_eq!(err.stage(), "generate");
    assert!(!lessons.join("chapter1.md").exists());
    assert!(!lessons.join("chapter1_graph.png").exists());
    assert!(!lessons.join("original").exists());
    assert!(!lessons.join("index.json").exists());
}

#[tokio::test]
async fn failure_after_progress_keeps_existing_index() {
    let tmp = TempDir::new().unwrap();
    let lessons = tmp.path().join("lessons");
    let pages = MemoryPages::numbered(12);

    produced(
        pipeline(&lessons, pages.clone(), Arc::new(RecordingGenerator::default()))
            .run_once()
            .await
            .unwrap(),
    );
    let index_before = std::fs::read(lessons.join("index.json")).unwrap();

    pipeline(&lessons, pages, RecordingGenerator::failing())
        .run_once()
        .await
        .unwrap_err();

    assert_eq!(std::fs::read(lessons.join("index.json")).unwrap(), index_before);
    assert!(!lessons.join("chapter2.md").exists());
}

#[tokio::test]
async fn corrupt_index_is_replaced_by_a_single_record() {
    let tmp = TempDir::new().unwrap();
    let lessons = tmp.path().join("lessons");
    std::fs::create_dir_all(&lessons).unwrap();
    std::fs::write(lessons.join("index.json"), "{ not json").unwrap();

    let pipeline = pipeline(
        &lessons,
        MemoryPages::numbered(12),
        Arc::new(RecordingGenerator::default()),
    );
    produced(pipeline.run_once().await.unwrap());

    let raw = std::fs::read_to_string(lessons.join("index.json")).unwrap();
    let records: Vec<LessonRecord> = serde_json::from_str(&raw).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "chapter1.md");
}

#[tokio::test]
async fn unrelated_files_do_not_shift_numbering() {
    let tmp = TempDir::new().unwrap();
    let lessons = tmp.path().join("lessons");
    std::fs::create_dir_all(lessons.join("original")).unwrap();
    std::fs::write(lessons.join("notes.md"), "x").unwrap();
    std::fs::write(lessons.join("chapter1_graph.png"), "x").unwrap();
    std::fs::write(lessons.join("book.pdf"), "x").unwrap();

    let pipeline = pipeline(
        &lessons,
        MemoryPages::numbered(12),
        Arc::new(RecordingGenerator::default()),
    );
    let lesson = produced(pipeline.run_once().await.unwrap());
    assert_eq!(lesson.unit.number, 1);
    assert_eq!(lesson.unit.pages(), 0..5);
}

#[tokio::test]
async fn plan_is_read_only() {
    let tmp = TempDir::new().unwrap();
    let lessons = tmp.path().join("lessons");
    let generator = Arc::new(RecordingGenerator::default());
    let pipeline = pipeline(&lessons, MemoryPages::numbered(7), generator.clone());

    let plan = pipeline.plan().await.unwrap();
    assert_eq!(plan.unit.number, 1);
    assert_eq!(plan.total_pages, 7);
    assert!(!plan.is_exhausted());
    assert!(!lessons.exists());
    assert_eq!(generator.calls(), 0);

    produced(pipeline.run_once().await.unwrap());
    produced(pipeline.run_once().await.unwrap());
    assert!(pipeline.plan().await.unwrap().is_exhausted());
}

#[tokio::test]
async fn progress_callback_sees_each_stage() {
    let tmp = TempDir::new().unwrap();
    let lessons = tmp.path().join("lessons");
    let progress = Arc::new(CountingProgress::default());
    let pipeline = pipeline(
        &lessons,
        MemoryPages::numbered(5),
        Arc::new(RecordingGenerator::default()),
    )
    .with_progress(progress.clone());

    produced(pipeline.run_once().await.unwrap());
    assert!(pipeline.run_once().await.unwrap().is_idle());

    assert_eq!(progress.planned.load(Ordering::SeqCst), 2);
    assert_eq!(progress.written.load(Ordering::SeqCst), 1);
    assert_eq!(progress.idle.load(Ordering::SeqCst), 1);
}
