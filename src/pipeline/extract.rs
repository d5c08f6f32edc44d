//! Page text extraction from the source document.
//!
//! The pipeline never touches pdfium directly: it reads pages through the
//! [`PageSource`] trait, so tests can hand in an in-memory document.
//! [`PdfiumSource`] is the production implementation.
//!
//! pdfium calls are blocking and CPU-bound; [`extract_text`] and
//! [`page_count`] move them onto the blocking thread pool.

use crate::error::LessonError;
use pdfium_render::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Read-only access to a paginated document.
pub trait PageSource: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self) -> Result<usize, LessonError>;

    /// Plain text of each page in `range`, in page order.
    ///
    /// `range` is already clamped to `0..page_count()`.
    fn page_texts(&self, range: Range<usize>) -> Result<Vec<String>, LessonError>;
}

/// Concatenate page texts, each followed by a newline.
pub fn join_pages(pages: &[String]) -> String {
    let mut text = String::with_capacity(pages.iter().map(|p| p.len() + 1).sum());
    for page in pages {
        text.push_str(page);
        text.push('\n');
    }
    text
}

/// Whether extracted text counts as "nothing more to do".
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Page count of `source`, off the async executor.
pub async fn page_count(source: &Arc<dyn PageSource>) -> Result<usize, LessonError> {
    let source = Arc::clone(source);
    tokio::task::spawn_blocking(move || source.page_count())
        .await
        .map_err(|e| LessonError::Internal(format!("Page count task panicked: {}", e)))?
}

/// Raw text of `range`, off the async executor.
///
/// An empty range yields an empty string without touching the document.
pub async fn extract_text(
    source: &Arc<dyn PageSource>,
    range: Range<usize>,
) -> Result<String, LessonError> {
    if range.is_empty() {
        return Ok(String::new());
    }
    let source = Arc::clone(source);
    let pages = tokio::task::spawn_blocking(move || source.page_texts(range))
        .await
        .map_err(|e| LessonError::Internal(format!("Extraction task panicked: {}", e)))??;
    Ok(join_pages(&pages))
}

// ── pdfium implementation ────────────────────────────────────────────────

/// A PDF on disk, read with pdfium.
///
/// Opening only validates the file; the document is parsed on each query.
#[derive(Debug, Clone)]
pub struct PdfiumSource {
    path: PathBuf,
    password: Option<String>,
}

impl PdfiumSource {
    /// Validate that `path` exists, is readable and looks like a PDF.
    pub fn open(path: impl Into<PathBuf>, password: Option<String>) -> Result<Self, LessonError> {
        let path = path.into();
        check_pdf_file(&path)?;
        debug!("Resolved source PDF: {}", path.display());
        Ok(Self { path, password })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_document<T>(
        &self,
        f: impl FnOnce(&PdfDocument<'_>) -> Result<T, LessonError>,
    ) -> Result<T, LessonError> {
        let pdfium = bind_pdfium()?;
        let document = pdfium
            .load_pdf_from_file(&self.path, self.password.as_deref())
            .map_err(|e| LessonError::CorruptPdf {
                path: self.path.clone(),
                detail: format!("{:?}", e),
            })?;
        f(&document)
    }
}

impl PageSource for PdfiumSource {
    fn page_count(&self) -> Result<usize, LessonError> {
        self.with_document(|doc| {
            let total = doc.pages().len() as usize;
            info!("PDF loaded: {} pages", total);
            Ok(total)
        })
    }

    fn page_texts(&self, range: Range<usize>) -> Result<Vec<String>, LessonError> {
        self.with_document(|doc| {
            let pages = doc.pages();
            let mut texts = Vec::with_capacity(range.len());
            for idx in range {
                let page = pages
                    .get(idx as u16)
                    .map_err(|e| LessonError::PageTextFailed {
                        page: idx,
                        detail: format!("{:?}", e),
                    })?;
                let text = page.text().map_err(|e| LessonError::PageTextFailed {
                    page: idx,
                    detail: format!("{:?}", e),
                })?;
                let text = text.all();
                debug!("Page {} → {} chars", idx, text.len());
                texts.push(text);
            }
            Ok(texts)
        })
    }
}

/// Bind pdfium: `PDFIUM_LIB_PATH`, then the working directory, then the system.
fn bind_pdfium() -> Result<Pdfium, LessonError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    };
    bindings
        .map(Pdfium::new)
        .map_err(|e| LessonError::PdfiumBindingFailed(format!("{:?}", e)))
}

/// Existence, permission and `%PDF` magic checks.
fn check_pdf_file(path: &Path) -> Result<(), LessonError> {
    if !path.exists() {
        return Err(LessonError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(LessonError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(LessonError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(LessonError::SourceNotFound {
            path: path.to_path_buf(),
        }),
    }
}
