//! `lessons/index.json`: the ordered list of produced lessons.
//!
//! Order is append order, which is chapter order. A missing, empty, unreadable
//! or corrupt file loads as an empty list; corruption resets the index rather
//! than failing the run.
//!
//! There is no locking. Two concurrent runs can both read the same list and
//! the last rename wins, dropping the other record. The pipeline is meant to
//! run as a single scheduled job.

use crate::error::LessonError;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One produced lesson, as stored in `index.json`.
///
/// Every field defaults to empty on load, so a hand-edited or older record
/// with a missing field is kept rather than discarding the whole index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonRecord {
    /// Lesson file name, e.g. `chapter3.md`.
    pub name: String,
    /// Lesson title, e.g. `Chapter 3: Quantum for Dummies`.
    pub title: String,
    /// Path of the rendered lesson.
    pub path: String,
    /// Path of the raw-text snapshot. Older indexes lack this field.
    pub original: String,
}

/// Reads and rewrites a JSON index file.
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current records; never fails.
    pub fn load(&self) -> Vec<LessonRecord> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(
                    "Index {} unreadable ({}); starting from an empty index",
                    self.path.display(),
                    e
                );
                return Vec::new();
            }
        };

        if raw.trim().is_empty() {
            return Vec::new();
        }

        // Only undecodable JSON or a non-array resets the index.
        let entries = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Index {} is corrupt ({}); starting from an empty index",
                    self.path.display(),
                    e
                );
                return Vec::new();
            }
        };

        let total = entries.len();
        let records: Vec<LessonRecord> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(i, entry)| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Dropping index entry {} of {}: {}", i, self.path.display(), e);
                    None
                }
            })
            .collect();
        debug!("Loaded {} of {} index records", records.len(), total);
        records
    }

    /// Append `record` and rewrite the whole file.
    ///
    /// A record whose `name` is already present replaces the old entry in
    /// place, so a chapter never appears twice. Returns the saved list.
    pub fn append_and_save(&self, record: LessonRecord) -> Result<Vec<LessonRecord>, LessonError> {
        let mut records = self.load();
        match records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => {
                warn!(
                    "Index already lists {}; replacing the stale record",
                    record.name
                );
                *existing = record;
            }
            None => records.push(record),
        }
        write_json_atomic(&self.path, &records)?;
        info!("Index {} now has {} lessons", self.path.display(), records.len());
        Ok(records)
    }

    /// [`Self::append_and_save`] on the blocking pool, for async callers.
    pub async fn append(&self, record: LessonRecord) -> Result<Vec<LessonRecord>, LessonError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.append_and_save(record))
            .await
            .map_err(|e| LessonError::Internal(format!("Index task panicked: {}", e)))?
    }
}

/// Serialise `value` with 2-space indentation and replace `path` with it.
///
/// The data goes to a temp file in the same directory first, then is renamed
/// over the destination, so readers see either the old or the new file.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), LessonError> {
    let fail = |detail: String| LessonError::IndexWriteFailed {
        path: path.to_path_buf(),
        detail,
    };

    let json = serde_json::to_string_pretty(value).map_err(|e| fail(e.to_string()))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| fail(e.to_string()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| fail(e.to_string()))?;
    tmp.write_all(json.as_bytes())
        .map_err(|e| fail(e.to_string()))?;
    // Temp files are created 0600; the published index is world-readable.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(|e| fail(e.to_string()))?;
    }
    tmp.persist(path).map_err(|e| fail(e.error.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(n: u32) -> LessonRecord {
        LessonRecord {
            name: format!("chapter{n}.md"),
            title: format!("Chapter {n}: Quantum for Dummies"),
            path: format!("lessons/chapter{n}.md"),
            original: format!("lessons/original/chapter{n}.txt"),
        }
    }

    #[test]
    fn missing_and_empty_files_load_empty() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path().join("index.json"));
        assert!(store.load().is_empty());

        std::fs::write(store.path(), "  \n").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_index_resets_to_single_record() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path().join("index.json"));
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_empty());

        let saved = store.append_and_save(record(1)).unwrap();
        assert_eq!(saved, vec![record(1)]);
        assert_eq!(store.load(), vec![record(1)]);
    }

    #[test]
    fn non_array_json_counts_as_corrupt() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path().join("index.json"));
        std::fs::write(store.path(), r#"{"name":"chapter1.md"}"#).unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn append_preserves_order_and_pretty_prints() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path().join("index.json"));
        store.append_and_save(record(1)).unwrap();
        store.append_and_save(record(2)).unwrap();

        let names: Vec<_> = store.load().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["chapter1.md", "chapter2.md"]);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("[\n  {\n    \"name\": \"chapter1.md\","), "got: {raw}");
        assert!(raw.contains("\"original\": \"lessons/original/chapter2.txt\""));
    }

    #[test]
    fn duplicate_chapter_replaces_in_place() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path().join("index.json"));
        store.append_and_save(record(1)).unwrap();
        store.append_and_save(record(2)).unwrap();

        let mut again = record(1);
        again.title = "Chapter 1: Retold".into();
        let saved = store.append_and_save(again.clone()).unwrap();

        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0], again);
        assert_eq!(saved[1], record(2));
    }

    #[test]
    fn records_without_original_still_load() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path().join("index.json"));
        std::fs::write(
            store.path(),
            r#"[{"name":"chapter1.md","title":"Chapter 1: Quantum for Dummies","path":"test_lessons/chapter1.md"}]"#,
        )
        .unwrap();
        let records = store.load();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].original, "");
    }

    #[test]
    fn record_missing_a_field_keeps_the_rest_of_the_index() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path().join("index.json"));
        let first = serde_json::to_value(record(1)).unwrap();
        let second = serde_json::json!({
            "name": "chapter2.md",
            "path": "lessons/chapter2.md",
            "original": "lessons/original/chapter2.txt"
        });
        std::fs::write(
            store.path(),
            serde_json::to_string_pretty(&vec![first, second]).unwrap(),
        )
        .unwrap();

        let loaded = store.load();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], record(1));
        assert_eq!(loaded[1].title, "");

        let saved = store.append_and_save(record(3)).unwrap();
        assert_eq!(saved.len(), 3);
        let names: Vec<_> = saved.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["chapter1.md", "chapter2.md", "chapter3.md"]);
    }

    #[test]
    fn non_object_entries_are_dropped_individually() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path().join("index.json"));
        let body = serde_json::json!([record(1), "stray", 42]);
        std::fs::write(store.path(), body.to_string()).unwrap();
        assert_eq!(store.load(), vec![record(1)]);
    }

    #[cfg(unix)]
    #[test]
    fn saved_index_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path().join("index.json"));
        store.append_and_save(record(1)).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[tokio::test]
    async fn async_append_runs_off_the_executor() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path().join("index.json"));
        store.append(record(1)).await.unwrap();
        let saved = store.append(record(2)).await.unwrap();
        assert_eq!(saved, vec![record(1), record(2)]);
    }

    #[test]
    fn save_creates_missing_parent() {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::new(tmp.path().join("fresh/lessons/index.json"));
        store.append_and_save(record(1)).unwrap();
        assert_eq!(store.load().len(), 1);
    }
}
