//! Prompts sent to the generative service.
//!
//! The chapter prompt is a template: callers may override it through
//! [`crate::config::LessonConfig::prompt_template`] as long as it keeps the
//! [`CHAPTER_TEXT_PLACEHOLDER`].

/// Placeholder replaced with the raw chapter text.
pub const CHAPTER_TEXT_PLACEHOLDER: &str = "{chapter_text}";

/// Default instructional prompt for a chapter explanation.
pub const DEFAULT_EXPLAIN_PROMPT: &str = "
Explain the following quantum computing textbook chapter for absolute beginners. \
Use simple words, analogies, and examples. Suggest a graph or diagram to help \
understanding, and describe it in words.

{chapter_text}
";

/// Topic used by paper discovery when none is configured.
pub const DEFAULT_PAPER_TOPIC: &str = "Estimating Ground Reaction Forces from Inertial Sensors";

/// Fill the chapter text into a prompt template.
pub fn explain_prompt(template: &str, chapter_text: &str) -> String {
    template.replace(CHAPTER_TEXT_PLACEHOLDER, chapter_text)
}

/// Build the paper-discovery prompt.
///
/// `explored` lists titles already present in the papers directory so the
/// model does not suggest them again.
pub fn paper_prompt(explored: &[String], topic: &str) -> String {
    format!(
        "Previously explored papers: {explored}. Please do not repeat these. \
Find a new, recent paper related to {topic}. Same topic, or in high relevance \
(e.g., Federated Learning, Personalization). Only select papers published in the last 3 years. \
Return ONLY a markdown file, with NO conversational text, NO explanations, and NO code block \
markers Just plan text for the readme file. \
The output must start with YAML frontmatter (delimited by ---) containing these fields: \
title, authors, journal, year, volume, issue, pages, doi, keywords, abstract. \
--- \n\
After the frontmatter, provide the following markdown sections in order:\n\
## Summary\n\
A concise summary of the paper.\n\
## Key Contributions and Insights\n\
Bullet points of the main contributions and insights.\n\
## Why this is State-of-the-Art\n\
Explain why this work is state-of-the-art.\n\
## Weaknesses or Limitations and How to Improve\n\
List weaknesses or limitations and suggest improvements.\n\
Do NOT include any conversational text, explanations, or code block markers. \
The output should start with '---' and end after the last section. No extra text.",
        explored = explored.join("; "),
        topic = topic,
    )
}
