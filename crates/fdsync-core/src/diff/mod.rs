//! Snapshot diff and filing extraction.
//!
//! Compares the cached baseline snapshot with the freshly fetched one and
//! turns the added lines into structured filing rows.
//!
//! ## Entry point
//!
//! ```
//! use fdsync_core::diff::extract_filings;
//! use fdsync_core::Snapshot;
//!
//! let old = Snapshot::empty();
//! let new = Snapshot::from("Hon. Smith John 01/02/2024 20240001234\n");
//! let extraction = extract_filings(&old, &new, "https://example.test/ptr-pdfs");
//! assert_eq!(extraction.rows[0].doc_id, "20240001234");
//! ```
//!
//! ## Guarantees
//!
//! - **No false positives**: `diff(old, old)` yields no rows.
//! - **Feed order**: rows come out in the order they first appear in `new`.
//! - **Run-scoped dedup**: at most one row per `doc_id` per extraction.
//! - **Explicit skips**: every added line that is not a filing is reported
//!   in `Extraction::skipped` with a reason.

pub mod extract;
pub mod line_diff;

pub use extract::{
    document_url, extract_filings, extract_filings_with_budget, parse_filing_line, Extraction,
    ParseSkip, SkipReason, DEFAULT_DOCUMENT_BASE_URL, HONORIFICS,
};
pub use line_diff::{added_lines, AddedLine, DiffStrategy, LineDiff, DEFAULT_MAX_EDITS};
