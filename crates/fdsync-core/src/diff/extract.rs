//! Filing-row extraction from snapshot additions.
//!
//! The feed is a whitespace-tokenized listing. A filing line looks like
//!
//! ```text
//! [Hon.|Dr.|Mr.|Ms.|Mrs.] Last First ... MM/DD/YYYY 2XXXXXXXXXX
//! ```
//!
//! Anything whose last token does not start with `2` is not a filing record
//! (headers, annual reports, blank lines) and is skipped. Skips are returned
//! as values so callers can count and log them.

use crate::diff::line_diff::{added_lines, DiffStrategy, DEFAULT_MAX_EDITS};
use crate::model::{FilingRow, Snapshot};
use crate::schema::EVENT_SKIP;
use std::collections::HashSet;

/// Leading tokens dropped before the name columns
pub const HONORIFICS: &[&str] = &["Hon.", "Dr.", "Mr.", "Ms.", "Mrs."];

/// Base URL of periodic transaction report PDFs
pub const DEFAULT_DOCUMENT_BASE_URL: &str =
    "https://disclosures-clerk.house.gov/public_disc/ptr-pdfs";

// Feed rows always carry last name, first name, date and doc id; a shorter
// line ending in a `2...` token is treated as noise, not a filing.
const MIN_FILING_TOKENS: usize = 4;

/// Why an added line did not produce a filing row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Empty or whitespace-only line
    Blank,
    /// Last token does not start with `2`
    NotAFiling,
    /// Fewer than four tokens once the honorific is removed
    TooFewTokens,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Blank => "blank",
            SkipReason::NotAFiling => "not_a_filing",
            SkipReason::TooFewTokens => "too_few_tokens",
        }
    }
}

/// An added line that failed the structural heuristic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSkip {
    /// Zero-based line index in the new snapshot
    pub line_index: usize,
    pub line: String,
    pub reason: SkipReason,
}

/// Outcome of diffing two snapshots and extracting filing rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Rows in order of first occurrence, unique by doc_id
    pub rows: Vec<FilingRow>,
    /// Number of lines the diff reported as added
    pub added_lines: usize,
    pub skipped: Vec<ParseSkip>,
    /// Rows dropped because their doc_id was already seen in this diff
    pub duplicates: usize,
    pub strategy: DiffStrategy,
}

impl Extraction {
    /// Count of skipped lines for a given reason
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }
}

/// `{base}/{last four chars of date}/{doc_id}.pdf`
pub fn document_url(base_url: &str, date: &str, doc_id: &str) -> String {
    let year_start = date
        .char_indices()
        .rev()
        .nth(3)
        .map(|(i, _)| i)
        .unwrap_or(0);
    format!(
        "{}/{}/{}.pdf",
        base_url.trim_end_matches('/'),
        &date[year_start..],
        doc_id
    )
}

/// Parse a single feed line into a filing row.
///
/// # Errors
///
/// Returns the [`SkipReason`] when the line is not a filing record.
pub fn parse_filing_line(line: &str, base_url: &str) -> Result<FilingRow, SkipReason> {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(SkipReason::Blank);
    }

    if HONORIFICS.contains(&tokens[0]) {
        tokens.remove(0);
    }

    match tokens.last() {
        Some(last) if last.starts_with('2') => {}
        _ => return Err(SkipReason::NotAFiling),
    }

    if tokens.len() < MIN_FILING_TOKENS {
        return Err(SkipReason::TooFewTokens);
    }

    let date = tokens[tokens.len() - 2];
    let doc_id = tokens[tokens.len() - 1];

    Ok(FilingRow {
        first_name: tokens[1].to_string(),
        last_name: tokens[0].to_string(),
        date: date.to_string(),
        doc_id: doc_id.to_string(),
        url: document_url(base_url, date, doc_id),
    })
}

/// Diff `old` against `new` and extract one filing row per new document.
pub fn extract_filings(old: &Snapshot, new: &Snapshot, base_url: &str) -> Extraction {
    extract_filings_with_budget(old, new, base_url, DEFAULT_MAX_EDITS)
}

/// As [`extract_filings`], with an explicit diff edit budget.
pub fn extract_filings_with_budget(
    old: &Snapshot,
    new: &Snapshot,
    base_url: &str,
    max_edits: usize,
) -> Extraction {
    let old_text = old.text();
    let new_text = new.text();
    let diff = added_lines(&old_text, &new_text, max_edits);

    if diff.strategy == DiffStrategy::MultisetFallback {
        tracing::warn!(
            max_edits = max_edits,
            added = diff.added.len(),
            "Edit budget exceeded, fell back to multiset line difference"
        );
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut rows = Vec::new();
    let mut skipped = Vec::new();
    let mut duplicates = 0;

    for added in &diff.added {
        match parse_filing_line(added.text, base_url) {
            Ok(row) => {
                if seen.insert(row.doc_id.clone()) {
                    rows.push(row);
                } else {
                    duplicates += 1;
                    tracing::debug!(
                        event = EVENT_SKIP,
                        doc_id = %row.doc_id,
                        line_index = added.index,
                        "Duplicate doc_id within diff"
                    );
                }
            }
            Err(reason) => {
                tracing::debug!(
                    event = EVENT_SKIP,
                    reason = reason.as_str(),
                    line_index = added.index,
                    "Added line is not a filing record"
                );
                skipped.push(ParseSkip {
                    line_index: added.index,
                    line: added.text.to_string(),
                    reason,
                });
            }
        }
    }

    Extraction {
        rows,
        added_lines: diff.added.len(),
        skipped,
        duplicates,
        strategy: diff.strategy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.test/ptr-pdfs/";

    #[test]
    fn test_parse_line_with_honorific() {
        let row = parse_filing_line("Hon. Smith John 01/02/2024 20240001234", BASE).unwrap();
        assert_eq!(row.last_name, "Smith");
        assert_eq!(row.first_name, "John");
        assert_eq!(row.date, "01/02/2024");
        assert_eq!(row.doc_id, "20240001234");
        assert_eq!(
            row.url,
            "https://example.test/ptr-pdfs/2024/20240001234.pdf"
        );
    }

    #[test]
    fn test_parse_tab_separated_feed_columns() {
        let line = "Hon.\tPelosi\tNancy\t\tP\tCA11\t2024\t1/23/2024\t20024542";
        let row = parse_filing_line(line, BASE).unwrap();
        assert_eq!(row.last_name, "Pelosi");
        assert_eq!(row.first_name, "Nancy");
        assert_eq!(row.date, "1/23/2024");
        assert_eq!(row.doc_id, "20024542");
        assert!(row.url.ends_with("/2024/20024542.pdf"));
    }

    #[test]
    fn test_header_and_non_ptr_lines_are_not_filings() {
        let header = "Prefix Last First Suffix FilingType StateDst Year FilingDate DocID";
        assert_eq!(
            parse_filing_line(header, BASE),
            Err(SkipReason::NotAFiling)
        );
        assert_eq!(
            parse_filing_line("Doe Jane O TX01 2024 5/15/2024 10056789", BASE),
            Err(SkipReason::NotAFiling)
        );
    }

    #[test]
    fn test_blank_and_short_lines() {
        assert_eq!(parse_filing_line("   ", BASE), Err(SkipReason::Blank));
        assert_eq!(
            parse_filing_line("Hon. Smith 20240001", BASE),
            Err(SkipReason::TooFewTokens)
        );
    }

    #[test]
    fn test_three_token_line_is_not_a_filing() {
        // A name, date and id with no first name would put the date in the
        // first-name column.
        assert_eq!(
            parse_filing_line("Smith 01/02/2024 20240001234", BASE),
            Err(SkipReason::TooFewTokens)
        );
        assert_eq!(
            parse_filing_line("Hon. Smith 01/02/2024 20240001234", BASE),
            Err(SkipReason::TooFewTokens)
        );
        assert!(parse_filing_line("Hon. Smith John 01/02/2024 20240001234", BASE).is_ok());
    }

    #[test]
    fn test_document_url_handles_short_dates() {
        assert_eq!(document_url("b", "24", "2x"), "b/24/2x.pdf");
        assert_eq!(document_url("b/", "01/02/2024", "2x"), "b/2024/2x.pdf");
    }

    #[test]
    fn test_skips_are_counted_by_reason() {
        let old = Snapshot::empty();
        let new = Snapshot::from("Prefix Last First DocID\n\nSmith John 01/02/2024 20240001234\n");
        let extraction = extract_filings(&old, &new, BASE);

        assert_eq!(extraction.rows.len(), 1);
        assert_eq!(extraction.added_lines, 3);
        assert_eq!(extraction.skipped_for(SkipReason::NotAFiling), 1);
        assert_eq!(extraction.skipped_for(SkipReason::Blank), 1);
        assert_eq!(extraction.skipped[0].line_index, 0);
    }
}
