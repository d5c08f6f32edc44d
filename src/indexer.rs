//! Flat JSON listings of the `classes/` and `papers/` trees.
//!
//! Each run regenerates the destination file wholesale. Entries are sorted
//! by path so an unchanged tree always produces byte-identical output.

use crate::error::LessonError;
use crate::index::write_json_atomic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Render a path with `/` separators whatever the host convention.
pub fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// File classification used by the classes index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Markdown,
    Asm,
}

impl FileKind {
    /// Classify by extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(FileKind::Pdf),
            "md" => Some(FileKind::Markdown),
            "asm" => Some(FileKind::Asm),
            _ => None,
        }
    }
}

/// One listed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIndexEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FileKind>,
}

/// Walks a directory tree and lists files with matching extensions.
#[derive(Debug, Clone)]
pub struct DirectoryIndexer {
    root: PathBuf,
    extensions: Vec<String>,
    classify: bool,
}

impl DirectoryIndexer {
    /// Index `root` for the given extensions (with or without leading dot).
    pub fn new<I, S>(root: impl Into<PathBuf>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            root: root.into(),
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            classify: false,
        }
    }

    /// Record a `type` for every entry.
    pub fn classified(mut self) -> Self {
        self.classify = true;
        self
    }

    /// Course material: PDFs, Markdown notes and assembly listings, typed.
    pub fn classes(root: impl Into<PathBuf>) -> Self {
        Self::new(root, ["pdf", "md", "asm"]).classified()
    }

    /// Paper summaries: Markdown only, untyped.
    pub fn papers(root: impl Into<PathBuf>) -> Self {
        Self::new(root, ["md"])
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Default destination: `<root>/index.json`.
    pub fn default_output(&self) -> PathBuf {
        self.root.join("index.json")
    }

    fn matching_extension(&self, path: &Path) -> Option<String> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.extensions.iter().any(|e| *e == ext).then_some(ext)
    }

    /// Walk the tree. A missing root yields an empty list.
    pub fn build(&self) -> Result<Vec<FileIndexEntry>, LessonError> {
        if !self.root.exists() {
            debug!("{} does not exist; empty index", self.root.display());
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry.map_err(|e| LessonError::WalkFailed {
                path: self.root.clone(),
                detail: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(ext) = self.matching_extension(entry.path()) else {
                continue;
            };
            entries.push(FileIndexEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: slash_path(entry.path()),
                kind: if self.classify {
                    FileKind::from_extension(&ext)
                } else {
                    None
                },
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// Build and overwrite `output` with the listing.
    pub fn write_index(&self, output: &Path) -> Result<Vec<FileIndexEntry>, LessonError> {
        let entries = self.build()?;
        write_json_atomic(output, &entries)?;
        info!("Generated {} with {} files", output.display(), entries.len());
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree(root: &Path, files: &[&str]) {
        for f in files {
            let p = root.join(f);
            std::fs::create_dir_all(p.parent().unwrap()).unwrap();
            std::fs::write(p, "x").unwrap();
        }
    }

    #[test]
    fn pdf_index_matches_case_insensitively_with_slash_paths() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("classes");
        tree(&root, &["a.pdf", "sub/b.PDF", "c.md"]);

        let entries = DirectoryIndexer::new(&root, [".pdf"]).classified().build().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.kind == Some(FileKind::Pdf)));
        assert!(entries.iter().all(|e| !e.path.contains('\\')));
        assert!(entries[0].path.ends_with("classes/a.pdf"));
        assert!(entries[1].path.ends_with("classes/sub/b.PDF"));
        assert_eq!(entries[1].name, "b.PDF");
    }

    #[test]
    fn classes_preset_types_each_extension() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("classes");
        tree(&root, &["os/boot.ASM", "os/notes.md", "os/slides.pdf", "os/readme.txt"]);

        let kinds: Vec<_> = DirectoryIndexer::classes(&root)
            .build()
            .unwrap()
            .into_iter()
            .map(|e| (e.name, e.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("boot.ASM".to_string(), Some(FileKind::Asm)),
                ("notes.md".to_string(), Some(FileKind::Markdown)),
                ("slides.pdf".to_string(), Some(FileKind::Pdf)),
            ]
        );
    }

    #[test]
    fn entries_are_sorted_by_path() {
        // A plain directory walk gives no ordering guarantee; the listing does.
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("papers");
        tree(&root, &["z.md", "b/a.md", "a.md", "m.md"]);

        let paths: Vec<_> = DirectoryIndexer::papers(&root)
            .build()
            .unwrap()
            .into_iter()
            .map(|e| e.path)
            .collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn papers_index_omits_type_field() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("papers");
        tree(&root, &["p.md"]);
        let out = root.join("index.json");

        DirectoryIndexer::papers(&root).write_index(&out).unwrap();
        let raw = std::fs::read_to_string(&out).unwrap();
        assert!(!raw.contains("\"type\""));
        assert!(raw.starts_with("[\n  {\n    \"name\": \"p.md\","));
    }

    #[test]
    fn rerun_is_byte_identical_and_overwrites() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("classes");
        tree(&root, &["x.pdf", "y/z.md"]);
        let out = root.join("index.json");
        std::fs::write(&out, "[\"stale\"]").unwrap();

        let indexer = DirectoryIndexer::classes(&root);
        indexer.write_index(&out).unwrap();
        let first = std::fs::read(&out).unwrap();
        indexer.write_index(&out).unwrap();
        assert_eq!(first, std::fs::read(&out).unwrap());
        assert!(!String::from_utf8(first).unwrap().contains("stale"));
    }

    #[test]
    fn missing_root_writes_empty_array() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("papers");
        let out = root.join("index.json");
        let entries = DirectoryIndexer::papers(&root).write_index(&out).unwrap();
        assert!(entries.is_empty());
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "[]");
    }

    #[test]
    fn slash_path_normalises_backslashes() {
        assert_eq!(slash_path(Path::new(r"classes\sub\b.PDF")), "classes/sub/b.PDF");
    }
}
