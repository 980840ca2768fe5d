//! EMA Extract Core Library
//!
//! Host-side plumbing for LLM-driven extraction of therapeutic indications
//! from EMA product labels.
//!
//! # Architecture
//!
//! ```text
//! Label text + instruction → Generation API → raw completion
//!                                                   │
//!                                        unwrap code fences
//!                                                   │
//!                                             parse JSON
//!                                                   │
//!                          ┌────────────────────────┼────────────────────────┐
//!                          ▼                        ▼                        ▼
//!                   Outline / tree            HTML report             JSON download
//! ```
//!
//! The model does the extraction. Nothing in this crate interprets the label
//! text or validates the returned records.
//!
//! # Modules
//!
//! - [`fence`]: code-fence unwrapping and completion parsing
//! - [`indication`]: record keys, field unwrapping, titles and summaries
//! - [`render`]: schema-less section model, text outline, tree and HTML report
//! - [`export`]: pretty JSON download
//! - [`session`]: last-result state for interactive use

pub mod export;
pub mod fence;
pub mod indication;
pub mod render;
pub mod session;

// Re-export commonly used types
pub use export::{ExportError, JsonDownload};
pub use fence::{parse_completion, unwrap_code_fence};
pub use indication::{summarize, ExtractionSummary, ScoredField};
pub use render::{formatted_details, render_outline, render_report, render_tree, ReportMeta, Section};
pub use session::{source_digest, ExtractionRecord, Session};
