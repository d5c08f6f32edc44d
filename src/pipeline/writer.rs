//! Lesson artifacts: rendered lesson, raw snapshot, placeholder graph.
//!
//! ```text
//! lessons/
//! ├── chapter<N>.md          rendered lesson
//! ├── chapter<N>_graph.png   placeholder visual
//! ├── original/
//! │   └── chapter<N>.txt     raw chapter text, verbatim
//! └── index.json             see crate::index
//! ```
//!
//! Paths depend only on the chapter number. Nothing here cleans up after a
//! failed write; the caller must not touch the index in that case.

use crate::error::LessonError;
use crate::index::LessonRecord;
use crate::indexer::slash_path;
use crate::pipeline::graph;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Deterministic artifact paths under a lessons directory.
#[derive(Debug, Clone)]
pub struct LessonLayout {
    root: PathBuf,
}

impl LessonLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lesson_name(chapter: u32) -> String {
        format!("chapter{chapter}.md")
    }

    pub fn lesson(&self, chapter: u32) -> PathBuf {
        self.root.join(Self::lesson_name(chapter))
    }

    pub fn graph(&self, chapter: u32) -> PathBuf {
        self.root.join(format!("chapter{chapter}_graph.png"))
    }

    pub fn original_dir(&self) -> PathBuf {
        self.root.join("original")
    }

    pub fn snapshot(&self, chapter: u32) -> PathBuf {
        self.original_dir().join(format!("chapter{chapter}.txt"))
    }

    pub fn index(&self) -> PathBuf {
        self.root.join("index.json")
    }
}

/// Render the lesson document: fixed heading, then the explanation verbatim.
pub fn render_lesson(title: &str, explanation: &str) -> String {
    format!("# {title}\n\n{explanation}\n")
}

/// Persists the three artifacts of a chapter.
#[derive(Debug, Clone)]
pub struct LessonWriter {
    layout: LessonLayout,
    subtitle: String,
}

impl LessonWriter {
    pub fn new(layout: LessonLayout, subtitle: impl Into<String>) -> Self {
        Self {
            layout,
            subtitle: subtitle.into(),
        }
    }

    pub fn layout(&self) -> &LessonLayout {
        &self.layout
    }

    pub fn title(&self, chapter: u32) -> String {
        format!("Chapter {}: {}", chapter, self.subtitle)
    }

    /// Write lesson, graph and snapshot for `chapter`.
    ///
    /// `raw_text` lands in the snapshot byte-for-byte.
    pub async fn write(
        &self,
        chapter: u32,
        raw_text: &str,
        explanation: &str,
    ) -> Result<LessonRecord, LessonError> {
        let title = self.title(chapter);
        let lesson_path = self.layout.lesson(chapter);
        let graph_path = self.layout.graph(chapter);
        let snapshot_path = self.layout.snapshot(chapter);

        create_dir(self.layout.root()).await?;
        write_file(&lesson_path, render_lesson(&title, explanation).as_bytes()).await?;

        let png = graph::placeholder_png().map_err(|e| LessonError::GraphRenderFailed {
            path: graph_path.clone(),
            detail: e.to_string(),
        })?;
        write_file(&graph_path, &png).await?;

        create_dir(&self.layout.original_dir()).await?;
        write_file(&snapshot_path, raw_text.as_bytes()).await?;

        info!("Wrote lesson {}", lesson_path.display());
        Ok(LessonRecord {
            name: LessonLayout::lesson_name(chapter),
            title,
            path: slash_path(&lesson_path),
            original: slash_path(&snapshot_path),
        })
    }
}

async fn create_dir(dir: &Path) -> Result<(), LessonError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| LessonError::WriteFailed {
            path: dir.to_path_buf(),
            source,
        })
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), LessonError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| LessonError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Wrote {} bytes → {}", bytes.len(), path.display());
    Ok(())
}
