//! Chapter planning: which chapter is next and which pages it covers.
//!
//! There is no persisted counter. The number of `chapter<N>.md` files in the
//! lessons directory *is* the state, so the next chapter is always
//! `count + 1` and repeated calls within one process agree with each other.

use crate::error::LessonError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::io::ErrorKind;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::debug;

static RE_LESSON_FILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^chapter\d+\.md$").unwrap());

/// Whether `file_name` is a rendered lesson (`chapter<N>.md`).
pub fn is_lesson_file_name(file_name: &str) -> bool {
    RE_LESSON_FILE.is_match(file_name)
}

/// Count rendered lesson files directly inside `dir`.
///
/// A missing directory counts as zero lessons.
pub fn count_existing_chapters(dir: &Path) -> Result<usize, LessonError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(source) => {
            return Err(LessonError::LessonsDirUnreadable {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut count = 0;
    for entry in entries {
        let entry = entry.map_err(|source| LessonError::LessonsDirUnreadable {
            path: dir.to_path_buf(),
            source,
        })?;
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if is_file && is_lesson_file_name(&entry.file_name().to_string_lossy()) {
            count += 1;
        }
    }
    debug!("Found {} existing lessons in {}", count, dir.display());
    Ok(count)
}

/// One scheduled slice of the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChapterUnit {
    /// 1-indexed chapter number.
    pub number: u32,
    /// First page, 0-indexed, inclusive.
    pub start_page: usize,
    /// Last page, 0-indexed, exclusive. Clamped to the page count.
    pub end_page: usize,
}

impl ChapterUnit {
    /// Derive the unit for `number` in a document of `total_pages` pages.
    ///
    /// When the chapter starts past the end of the document the range is
    /// empty (`start_page == end_page`).
    pub fn new(number: u32, page_span: usize, total_pages: usize) -> Self {
        let range = page_range_for(number, page_span, total_pages);
        Self {
            number,
            start_page: range.start,
            end_page: range.end,
        }
    }

    pub fn pages(&self) -> Range<usize> {
        self.start_page..self.end_page
    }

    pub fn is_empty(&self) -> bool {
        self.start_page >= self.end_page
    }
}

/// Page range covered by chapter `number`.
pub fn page_range_for(number: u32, page_span: usize, total_pages: usize) -> Range<usize> {
    let start = (number.max(1) as usize - 1).saturating_mul(page_span);
    if start >= total_pages {
        return start..start;
    }
    let end = start.saturating_add(page_span).min(total_pages);
    start..end
}

/// Decides the next chapter from the artifacts already on disk.
#[derive(Debug, Clone)]
pub struct ChapterPlanner {
    lessons_dir: PathBuf,
    page_span: usize,
}

impl ChapterPlanner {
    pub fn new(lessons_dir: impl Into<PathBuf>, page_span: usize) -> Self {
        Self {
            lessons_dir: lessons_dir.into(),
            page_span,
        }
    }

    pub fn page_span(&self) -> usize {
        self.page_span
    }

    /// `count(chapter<N>.md) + 1`.
    pub fn next_chapter_number(&self) -> Result<u32, LessonError> {
        let count = count_existing_chapters(&self.lessons_dir)?;
        u32::try_from(count + 1)
            .map_err(|_| LessonError::Internal(format!("chapter count overflow: {count}")))
    }

    pub fn page_range_for(&self, number: u32, total_pages: usize) -> Range<usize> {
        page_range_for(number, self.page_span, total_pages)
    }

    /// Plan the next chapter for a document of `total_pages` pages.
    pub fn next_unit(&self, total_pages: usize) -> Result<ChapterUnit, LessonError> {
        let number = self.next_chapter_number()?;
        Ok(ChapterUnit::new(number, self.page_span, total_pages))
    }
}
