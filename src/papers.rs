//! Paper discovery: ask the model for one new paper summary per run.
//!
//! Titles already present in `papers/*.md` are sent along so the model
//! does not repeat itself. Each reply becomes
//! `papers/gemini_<date>_<id>.md`, where `<id>` comes from the DOI in the
//! front matter, or from a content hash when there is none.

use crate::config::PaperConfig;
use crate::error::LessonError;
use crate::pipeline::generate::ExplanationGenerator;
use crate::pipeline::postprocess::{clean_paper, has_front_matter};
use crate::prompts::paper_prompt;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

static RE_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"title:\s*"(.*?)""#).unwrap());
static RE_DOI: Lazy<Regex> = Lazy::new(|| Regex::new(r"doi:\s*([\w./-]+)").unwrap());

/// Titles of papers already saved directly under `papers_dir`.
///
/// Files that cannot be read, or carry no `title: "..."` line, are skipped.
pub fn explored_titles(papers_dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(papers_dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "md"))
        .collect();
    files.sort();

    files
        .iter()
        .filter_map(|p| match std::fs::read_to_string(p) {
            Ok(content) => RE_TITLE.captures(&content).map(|c| c[1].to_string()),
            Err(e) => {
                debug!("Skipping {}: {}", p.display(), e);
                None
            }
        })
        .collect()
}

/// File-name id: the DOI with `/` and `.` turned into `-`, else a hash.
pub fn paper_id(markdown: &str) -> String {
    match RE_DOI.captures(markdown) {
        Some(caps) => caps[1].replace(['/', '.'], "-"),
        None => {
            let digest = Sha256::digest(markdown.as_bytes());
            let hex = format!("{:x}", digest);
            format!("no-doi-{}", &hex[..8])
        }
    }
}

/// `gemini_<YYYY-MM-DD>_<id>.md`
pub fn paper_file_name(markdown: &str, date: NaiveDate) -> String {
    format!("gemini_{}_{}.md", date.format("%Y-%m-%d"), paper_id(markdown))
}

/// Request one new paper summary and save it. Returns the written path.
pub async fn fetch_paper(
    generator: &dyn ExplanationGenerator,
    config: &PaperConfig,
    date: NaiveDate,
) -> Result<PathBuf, LessonError> {
    let explored = explored_titles(&config.papers_dir);
    info!("{} papers already explored", explored.len());

    let prompt = paper_prompt(&explored, &config.topic);
    let reply = generator.generate(&prompt).await?;
    let markdown = clean_paper(&reply);
    if !has_front_matter(&markdown) {
        warn!("Generated paper does not start with YAML front matter");
    }

    tokio::fs::create_dir_all(&config.papers_dir)
        .await
        .map_err(|source| LessonError::WriteFailed {
            path: config.papers_dir.clone(),
            source,
        })?;

    let path = config.papers_dir.join(paper_file_name(&markdown, date));
    tokio::fs::write(&path, markdown.as_bytes())
        .await
        .map_err(|source| LessonError::WriteFailed {
            path: path.clone(),
            source,
        })?;

    info!("Saved paper to {}", path.display());
    Ok(path)
}
