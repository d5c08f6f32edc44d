//! Error types for the pdf2lesson library.
//!
//! Every fatal condition of a run is a [`LessonError`]. The idle outcome
//! ("no more chapters") is not an error: it is reported as
//! [`crate::run::RunOutcome::Idle`].
//!
//! Recoverable conditions (a corrupt or unreadable `index.json`, a duplicate
//! chapter record) never surface here; they are logged and handled where
//! they occur.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2lesson library.
#[derive(Debug, Error)]
pub enum LessonError {
    // ── Precondition errors ───────────────────────────────────────────────
    /// The credential for the generative service is not set.
    #[error("{var} not set.\nExport it before running: export {var}=<key>")]
    MissingCredential { var: String },

    /// The configured LLM provider could not be initialised.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Source document errors ────────────────────────────────────────────
    /// Source PDF was not found at the given path.
    #[error("Source PDF not found: '{path}'\nCheck the path exists and is readable.")]
    SourceNotFound { path: PathBuf },

    /// Process does not have read permission on the source PDF.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// pdfium could not open the document.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// Text extraction failed for a specific page (0-indexed).
    #[error("Text extraction failed for page {page}: {detail}")]
    PageTextFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library in the working\n\
directory, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Planning errors ───────────────────────────────────────────────────
    /// The lessons directory exists but could not be listed.
    #[error("Failed to list lessons directory '{path}': {source}")]
    LessonsDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Generative service errors ─────────────────────────────────────────
    /// The request never produced an HTTP response (DNS, TLS, timeout).
    #[error("Request to generative service failed: {reason}")]
    RequestFailed { reason: String },

    /// The service answered with a non-success status.
    #[error("Generative service returned HTTP {status}\nResponse body: {body}")]
    ServiceStatus { status: u16, body: String },

    /// The service answered 2xx but the body did not contain generated text.
    #[error("Could not parse generative service response: {detail}\nFull response: {body}")]
    MalformedResponse { detail: String, body: String },

    /// The LLM provider returned an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write a lesson artifact.
    #[error("Failed to write '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The placeholder figure could not be encoded.
    #[error("Failed to render placeholder graph '{path}': {detail}")]
    GraphRenderFailed { path: PathBuf, detail: String },

    /// Could not rewrite an index file.
    #[error("Failed to write index '{path}': {detail}")]
    IndexWriteFailed { path: PathBuf, detail: String },

    /// Walking a directory for the file index failed.
    #[error("Failed to walk '{path}': {detail}")]
    WalkFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LessonError {
    /// Name of the pipeline stage that produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            LessonError::MissingCredential { .. } | LessonError::ProviderNotConfigured { .. } => {
                "precondition"
            }
            LessonError::SourceNotFound { .. }
            | LessonError::PermissionDenied { .. }
            | LessonError::NotAPdf { .. }
            | LessonError::CorruptPdf { .. }
            | LessonError::PageTextFailed { .. }
            | LessonError::PdfiumBindingFailed(_) => "source",
            LessonError::LessonsDirUnreadable { .. } => "plan",
            LessonError::RequestFailed { .. }
            | LessonError::ServiceStatus { .. }
            | LessonError::MalformedResponse { .. }
            | LessonError::LlmApiError { .. } => "generate",
            LessonError::WriteFailed { .. } | LessonError::GraphRenderFailed { .. } => "write",
            LessonError::IndexWriteFailed { .. } | LessonError::WalkFailed { .. } => "index",
            LessonError::InvalidConfig(_) => "config",
            LessonError::Internal(_) => "internal",
        }
    }
}
