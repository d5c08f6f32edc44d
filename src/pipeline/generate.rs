//! Explanation generation: the one network call of a run.
//!
//! [`ExplanationGenerator`] is the seam: the pipeline hands it a finished
//! prompt and gets back free-form text. Two implementations ship:
//!
//! * [`GeminiGenerator`]: a direct `generateContent` call carrying the key
//!   in the `X-goog-api-key` header. The default.
//! * [`ProviderGenerator`]: any edgequake-llm provider (OpenAI, Anthropic,
//!   Ollama, ...), selected with `provider_name`.
//!
//! No retries: any failure aborts the run before a lesson is written.

use crate::config::{LessonConfig, API_KEY_ENV};
use crate::error::LessonError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default Gemini API base URL.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Turns a prompt into generated text.
#[async_trait]
pub trait ExplanationGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LessonError>;
}

// ── Gemini ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Pull `candidates[0].content.parts[0].text` out of a response body.
pub fn parse_generate_response(body: &str) -> Result<String, LessonError> {
    let malformed = |detail: String| LessonError::MalformedResponse {
        detail,
        body: body.to_string(),
    };

    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| malformed(format!("invalid JSON: {e}")))?;

    parsed
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| malformed("no candidates".into()))?
        .content
        .ok_or_else(|| malformed("candidate has no content".into()))?
        .parts
        .into_iter()
        .next()
        .ok_or_else(|| malformed("content has no parts".into()))?
        .text
        .ok_or_else(|| malformed("first part has no text".into()))
}

/// Direct client for the Gemini `generateContent` endpoint.
pub struct GeminiGenerator {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl GeminiGenerator {
    /// Build a client for `model`.
    ///
    /// Fails with [`LessonError::MissingCredential`] when `api_key` is unset,
    /// before anything else happens.
    pub fn new(
        api_key: Option<&str>,
        model: &str,
        base_url: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, LessonError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LessonError::MissingCredential {
                var: API_KEY_ENV.to_string(),
            })?
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LessonError::Internal(format!("HTTP client: {e}")))?;

        let base = base_url.unwrap_or(GEMINI_BASE_URL).trim_end_matches('/');
        let url = format!("{base}/v1beta/models/{model}:generateContent");

        Ok(Self {
            client,
            url,
            api_key,
        })
    }

    pub fn from_config(config: &LessonConfig) -> Result<Self, LessonError> {
        Self::new(
            config.api_key.as_deref(),
            &config.model,
            config.endpoint.as_deref(),
            config.request_timeout_secs,
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ExplanationGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LessonError> {
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        info!("Requesting explanation ({} prompt chars)", prompt.len());
        let response = self
            .client
            .post(&self.url)
            .header("X-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LessonError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LessonError::RequestFailed {
                reason: format!("failed to read response body: {e}"),
            })?;

        if !status.is_success() {
            return Err(LessonError::ServiceStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let generated = parse_generate_response(&text)?;
        debug!("Generated {} chars", generated.len());
        Ok(generated)
    }
}

// ── edgequake-llm providers ──────────────────────────────────────────────

/// Error type returned by a [`ChatCompletion`] backend.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// The part of an LLM provider [`ProviderGenerator`] relies on: one user
/// turn in, the reply text out.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, BackendError>;
}

/// The prompt as a single user message.
pub fn user_turn(prompt: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(prompt)]
}

#[async_trait]
impl ChatCompletion for Arc<dyn LLMProvider> {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, BackendError> {
        let messages = user_turn(prompt);
        let response = self
            .chat(&messages, Some(options))
            .await
            .map_err(|e| -> BackendError { e.to_string().into() })?;
        debug!(
            "{} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Adapter over an edgequake-llm provider.
pub struct ProviderGenerator {
    backend: Arc<dyn ChatCompletion>,
    options: CompletionOptions,
}

impl ProviderGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &LessonConfig) -> Self {
        Self::with_backend(Arc::new(provider), config)
    }

    /// Use any [`ChatCompletion`] backend with the config's sampling options.
    pub fn with_backend(backend: Arc<dyn ChatCompletion>, config: &LessonConfig) -> Self {
        Self {
            backend,
            options: CompletionOptions {
                temperature: Some(config.temperature),
                max_tokens: Some(config.max_tokens),
                ..Default::default()
            },
        }
    }

    /// Instantiate the named provider; its API key is read from the
    /// provider's own environment variable.
    pub fn from_name(name: &str, config: &LessonConfig) -> Result<Self, LessonError> {
        let provider = ProviderFactory::create_llm_provider(name, &config.model).map_err(|e| {
            LessonError::ProviderNotConfigured {
                provider: name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(provider, config))
    }
}

#[async_trait]
impl ExplanationGenerator for ProviderGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LessonError> {
        self.backend
            .complete(prompt, &self.options)
            .await
            .map_err(|e| LessonError::LlmApiError {
                message: e.to_string(),
            })
    }
}

/// Build the generator a config asks for.
///
/// This is the credential precondition: it runs before the source document
/// is touched.
pub fn resolve_generator(
    config: &LessonConfig,
) -> Result<Arc<dyn ExplanationGenerator>, LessonError> {
    match config.provider_name.as_deref() {
        Some(name) => Ok(Arc::new(ProviderGenerator::from_name(name, config)?)),
        None => Ok(Arc::new(GeminiGenerator::from_config(config)?)),
    }
}
