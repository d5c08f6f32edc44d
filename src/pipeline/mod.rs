//! Pipeline stages for turning one chapter of the source PDF into a lesson.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the two external collaborators (document, generative model) can
//! be swapped for fakes.
//!
//! ## Data Flow
//!
//! ```text
//! planner ──▶ extract ──▶ generate ──▶ writer ──▶ crate::index
//! (count)     (pdfium)    (LLM call)   (3 files)  (index.json)
//! ```
//!
//! 1. [`planner`]: next chapter number and page range from files on disk
//! 2. [`extract`]: raw page text; pdfium work runs in `spawn_blocking`
//! 3. [`generate`]: the single network call; no retries
//! 4. [`writer`]: lesson Markdown, raw snapshot and [`graph`] placeholder
//!
//! [`postprocess`] cleans generated paper summaries; lessons are stored
//! verbatim.

pub mod extract;
pub mod generate;
pub mod graph;
pub mod planner;
pub mod postprocess;
pub mod writer;
