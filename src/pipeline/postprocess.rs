//! Cleanup of generated paper summaries before they are saved.
//!
//! The discovery prompt asks for bare Markdown starting with `---`, but
//! models still wrap replies in code fences, emit CRLF line endings or slip
//! in zero-width characters. Chapter explanations are *not* passed through
//! here: lessons keep the generator's output verbatim.
//!
//! Rules run in order: fences first so the front-matter check sees the real
//! first line, final newline last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to a generated paper.
///
/// 1. Strip an outer ```` ```markdown ```` / ```` ```yaml ```` fence
/// 2. Normalise line endings (CRLF → LF)
/// 3. Strip invisible Unicode (zero-width spaces, BOM)
/// 4. Trim trailing whitespace per line
/// 5. Ensure the file ends with exactly one newline
pub fn clean_paper(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    ensure_final_newline(&s)
}

/// Whether the cleaned document opens with YAML front matter.
pub fn has_front_matter(markdown: &str) -> bool {
    markdown.trim_start().starts_with("---")
}

// ── Rule 1: Strip outer fence ────────────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md|yaml)?[ \t]*\r?\n(.*)\r?\n```\s*$").unwrap());

fn strip_outer_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Strip invisible characters ───────────────────────────────────────

const INVISIBLE: [char; 5] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

fn remove_invisible_chars(input: &str) -> String {
    input.chars().filter(|c| !INVISIBLE.contains(c)).collect()
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Single final newline ─────────────────────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}
