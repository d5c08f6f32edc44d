//! Configuration types for lesson generation and paper discovery.
//!
//! All pipeline behaviour is controlled through [`LessonConfig`], built via
//! its [`LessonConfigBuilder`]. Paper discovery has its own, smaller
//! [`PaperConfig`].

use crate::error::LessonError;
use crate::prompts::{CHAPTER_TEXT_PLACEHOLDER, DEFAULT_EXPLAIN_PROMPT, DEFAULT_PAPER_TOPIC};
use std::fmt;
use std::path::PathBuf;

/// Pages per chapter unit unless configured otherwise.
pub const DEFAULT_PAGE_SPAN: usize = 5;

/// Model used for the Gemini `generateContent` endpoint.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Environment variable holding the generative-service credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Configuration for one run of the chapter pipeline.
///
/// # Example
/// ```rust
/// use pdf2lesson::LessonConfig;
///
/// let config = LessonConfig::builder()
///     .source_pdf("book.pdf")
///     .lessons_dir("lessons")
///     .page_span(8)
///     .build()
///     .unwrap();
/// assert_eq!(config.page_span, 8);
/// ```
#[derive(Clone)]
pub struct LessonConfig {
    /// Source textbook. Read-only input. Default:
    /// `lessons/introduction-to-classical-and-quantum-computing.pdf`.
    pub source_pdf: PathBuf,

    /// Directory owning every lesson artifact and `index.json`. Default: `lessons`.
    pub lessons_dir: PathBuf,

    /// Pages per chapter unit. Default: 5. Must be at least 1.
    pub page_span: usize,

    /// Fixed subtitle of every lesson heading: `Chapter <N>: <subtitle>`.
    pub subtitle: String,

    /// Instructional prompt; `{chapter_text}` is replaced with the raw text.
    pub prompt_template: String,

    /// Model identifier. Default: `gemini-2.0-flash`.
    pub model: String,

    /// Credential for the Gemini endpoint, usually from `GEMINI_API_KEY`.
    pub api_key: Option<String>,

    /// Override of the Gemini API base URL (tests, proxies).
    pub endpoint: Option<String>,

    /// Use this edgequake-llm provider (e.g. "openai", "ollama") instead of
    /// the direct Gemini endpoint.
    pub provider_name: Option<String>,

    /// Sampling temperature for the provider route. Default: 0.4.
    pub temperature: f32,

    /// Output token ceiling for the provider route. Default: 4096.
    pub max_tokens: usize,

    /// Timeout for the single generation request. Default: 120.
    pub request_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,
}

impl Default for LessonConfig {
    fn default() -> Self {
        Self {
            source_pdf: PathBuf::from("lessons/introduction-to-classical-and-quantum-computing.pdf"),
            lessons_dir: PathBuf::from("lessons"),
            page_span: DEFAULT_PAGE_SPAN,
            subtitle: "Quantum for Dummies".to_string(),
            prompt_template: DEFAULT_EXPLAIN_PROMPT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            endpoint: None,
            provider_name: None,
            temperature: 0.4,
            max_tokens: 4096,
            request_timeout_secs: 120,
            password: None,
        }
    }
}

impl fmt::Debug for LessonConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LessonConfig")
            .field("source_pdf", &self.source_pdf)
            .field("lessons_dir", &self.lessons_dir)
            .field("page_span", &self.page_span)
            .field("subtitle", &self.subtitle)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("provider_name", &self.provider_name)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl LessonConfig {
    /// Create a new builder for `LessonConfig`.
    pub fn builder() -> LessonConfigBuilder {
        LessonConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`LessonConfig`].
#[derive(Debug)]
pub struct LessonConfigBuilder {
    config: LessonConfig,
}

impl LessonConfigBuilder {
    pub fn source_pdf(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.source_pdf = path.into();
        self
    }

    pub fn lessons_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.lessons_dir = dir.into();
        self
    }

    pub fn page_span(mut self, span: usize) -> Self {
        self.config.page_span = span;
        self
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.config.subtitle = subtitle.into();
        self
    }

    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = template.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the credential. Empty strings count as unset.
    pub fn api_key(mut self, key: Option<String>) -> Self {
        self.config.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = Some(url.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<LessonConfig, LessonError> {
        let c = &self.config;
        if c.page_span == 0 {
            return Err(LessonError::InvalidConfig("page span must be ≥ 1".into()));
        }
        if !c.prompt_template.contains(CHAPTER_TEXT_PLACEHOLDER) {
            return Err(LessonError::InvalidConfig(format!(
                "prompt template must contain the {CHAPTER_TEXT_PLACEHOLDER} placeholder"
            )));
        }
        if c.subtitle.trim().is_empty() {
            return Err(LessonError::InvalidConfig("subtitle must not be empty".into()));
        }
        if c.request_timeout_secs == 0 {
            return Err(LessonError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Configuration for paper discovery.
#[derive(Debug, Clone)]
pub struct PaperConfig {
    /// Directory holding previously fetched papers. Default: `papers`.
    pub papers_dir: PathBuf,
    /// Research topic the model is asked to find a paper about.
    pub topic: String,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            papers_dir: PathBuf::from("papers"),
            topic: DEFAULT_PAPER_TOPIC.to_string(),
        }
    }
}
