//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn LessonProgressCallback>`] via
//! [`crate::run::LessonPipeline::with_progress`] to observe a run as it moves
//! from planning to the index update. The CLI uses it to drive a spinner.
//!
//! # Example
//!
//! ```rust
//! use pdf2lesson::{ChapterUnit, LessonProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! struct LastPlanned(AtomicU32);
//!
//! impl LessonProgressCallback for LastPlanned {
//!     fn on_chapter_planned(&self, unit: &ChapterUnit, _total_pages: usize) {
//!         self.0.store(unit.number, Ordering::SeqCst);
//!     }
//! }
//!
//! let cb = Arc::new(LastPlanned(AtomicU32::new(0)));
//! let _as_dyn: Arc<dyn LessonProgressCallback> = cb;
//! ```

use crate::index::LessonRecord;
use crate::pipeline::planner::ChapterUnit;
use std::sync::Arc;

/// Called by the pipeline at each stage boundary.
///
/// All methods default to no-ops so implementors only override what they
/// care about.
pub trait LessonProgressCallback: Send + Sync {
    /// The next chapter and its page range are known.
    fn on_chapter_planned(&self, unit: &ChapterUnit, total_pages: usize) {
        let _ = (unit, total_pages);
    }

    /// Raw text was pulled from the page range.
    fn on_text_extracted(&self, chapter: u32, chars: usize) {
        let _ = (chapter, chars);
    }

    /// The generation request is about to be sent.
    fn on_generation_start(&self, chapter: u32) {
        let _ = chapter;
    }

    /// All three artifacts are on disk and the index was rewritten.
    fn on_lesson_written(&self, record: &LessonRecord) {
        let _ = record;
    }

    /// The page range held no text; the run ends without output.
    fn on_idle(&self, chapter: u32) {
        let _ = chapter;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl LessonProgressCallback for NoopProgressCallback {}

/// Convenience alias for the shared callback handle.
pub type ProgressCallback = Arc<dyn LessonProgressCallback>;
