#![allow(clippy::unwrap_used, clippy::expect_used)]

use fdsync_core::diff::{extract_filings, extract_filings_with_budget, DiffStrategy, SkipReason};
use fdsync_core::{FilingRow, Snapshot};
use proptest::prelude::*;

const BASE: &str = "https://disclosures-clerk.house.gov/public_disc/ptr-pdfs/";

fn filing_line(last: &str, first: &str, date: &str, doc_id: &str) -> String {
    format!("Hon.\t{}\t{}\t\tP\tCA12\t2024\t{}\t{}", last, first, date, doc_id)
}

#[test]
fn test_scenario_empty_baseline_single_filing() {
    let old = Snapshot::empty();
    let new = Snapshot::from("Hon. Smith John 01/02/2024 20240001234\n");

    let extraction = extract_filings(&old, &new, BASE);

    assert_eq!(
        extraction.rows,
        vec![FilingRow {
            first_name: "John".to_string(),
            last_name: "Smith".to_string(),
            date: "01/02/2024".to_string(),
            doc_id: "20240001234".to_string(),
            url: "https://disclosures-clerk.house.gov/public_disc/ptr-pdfs/2024/20240001234.pdf"
                .to_string(),
        }]
    );
}

#[test]
fn test_unchanged_snapshot_yields_nothing() {
    let content = [
        "Prefix\tLast\tFirst\tSuffix\tFilingType\tStateDst\tYear\tFilingDate\tDocID",
        filing_line("Smith", "John", "01/02/2024", "20240001234").as_str(),
        filing_line("Doe", "Jane", "01/03/2024", "20240001235").as_str(),
    ]
    .join("\n");
    let snapshot = Snapshot::from(content);

    let extraction = extract_filings(&snapshot, &snapshot, BASE);

    assert!(extraction.rows.is_empty());
    assert_eq!(extraction.added_lines, 0);
    assert!(extraction.skipped.is_empty());
}

#[test]
fn test_duplicate_doc_id_within_one_diff_yields_one_row() {
    let old = Snapshot::empty();
    let new = Snapshot::from(
        [
            filing_line("Smith", "John", "01/02/2024", "20240001234"),
            filing_line("Smith", "Johnny", "01/02/2024", "20240001234"),
        ]
        .join("\n"),
    );

    let extraction = extract_filings(&old, &new, BASE);

    assert_eq!(extraction.rows.len(), 1);
    assert_eq!(extraction.rows[0].first_name, "John");
    assert_eq!(extraction.duplicates, 1);
}

#[test]
fn test_rows_from_baseline_are_not_reported() {
    let first = filing_line("Smith", "John", "01/02/2024", "20240001234");
    let second = filing_line("Doe", "Jane", "01/03/2024", "20240001235");
    let old = Snapshot::from(format!("{}\n", first));
    let new = Snapshot::from(format!("{}\n{}\n", first, second));

    let extraction = extract_filings(&old, &new, BASE);

    assert_eq!(extraction.rows.len(), 1);
    assert_eq!(extraction.rows[0].doc_id, "20240001235");
}

#[test]
fn test_republished_feed_with_middle_insertion() {
    let a = filing_line("Adams", "Ann", "01/02/2024", "20240000001");
    let b = filing_line("Baker", "Bob", "01/03/2024", "20240000002");
    let c = filing_line("Clark", "Cid", "01/04/2024", "20240000003");
    let old = Snapshot::from([a.as_str(), c.as_str()].join("\n"));
    let new = Snapshot::from([a.as_str(), b.as_str(), c.as_str()].join("\n"));

    let extraction = extract_filings(&old, &new, BASE);

    assert_eq!(extraction.rows.len(), 1);
    assert_eq!(extraction.rows[0].last_name, "Baker");
}

#[test]
fn test_fallback_still_extracts_appended_rows() {
    let a = filing_line("Adams", "Ann", "01/02/2024", "20240000001");
    let b = filing_line("Baker", "Bob", "01/03/2024", "20240000002");
    let c = filing_line("Clark", "Cid", "01/04/2024", "20240000003");
    let d = filing_line("Drew", "Dee", "01/05/2024", "20240000004");
    let old = Snapshot::from([a.as_str(), b.as_str(), c.as_str()].join("\n"));
    let new = Snapshot::from([c.as_str(), b.as_str(), a.as_str(), d.as_str()].join("\n"));

    let extraction = extract_filings_with_budget(&old, &new, BASE, 1);

    assert_eq!(extraction.strategy, DiffStrategy::MultisetFallback);
    assert_eq!(extraction.rows.len(), 1);
    assert_eq!(extraction.rows[0].doc_id, "20240000004");
}

fn name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{1,8}"
}

fn filing_date() -> impl Strategy<Value = String> {
    (1u8..=12, 1u8..=28, 2008u16..=2030).prop_map(|(m, d, y)| format!("{:02}/{:02}/{}", m, d, y))
}

fn people(max: usize) -> impl Strategy<Value = Vec<(String, String, String)>> {
    prop::collection::vec((name(), name(), filing_date()), 0..max)
}

fn render(people: &[(String, String, String)], id_base: usize) -> Vec<(String, String)> {
    people
        .iter()
        .enumerate()
        .map(|(i, (last, first, date))| {
            let doc_id = format!("2{:010}", id_base + i);
            (filing_line(last, first, date, &doc_id), doc_id)
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_appended_lines_are_extracted_in_feed_order(
        existing in people(20),
        appended in people(20),
    ) {
        let old_lines = render(&existing, 0);
        let new_lines = render(&appended, 1_000);

        let old_text: Vec<&str> = old_lines.iter().map(|(l, _)| l.as_str()).collect();
        let mut new_text = old_text.clone();
        new_text.extend(new_lines.iter().map(|(l, _)| l.as_str()));

        let old = Snapshot::from(old_text.join("\n"));
        let new = Snapshot::from(new_text.join("\n"));
        let extraction = extract_filings(&old, &new, BASE);

        let got: Vec<&str> = extraction.rows.iter().map(|r| r.doc_id.as_str()).collect();
        let expected: Vec<&str> = new_lines.iter().map(|(_, id)| id.as_str()).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_self_diff_is_empty(existing in people(30)) {
        let lines: Vec<String> = render(&existing, 0).into_iter().map(|(l, _)| l).collect();
        let snapshot = Snapshot::from(lines.join("\n"));
        let extraction = extract_filings(&snapshot, &snapshot, BASE);
        prop_assert!(extraction.rows.is_empty());
    }

    #[test]
    fn prop_last_token_not_starting_with_two_is_excluded(
        last in name(),
        first in name(),
        date in filing_date(),
        doc_id in "[013-9][0-9]{4,10}",
    ) {
        let line = filing_line(&last, &first, &date, &doc_id);
        let extraction = extract_filings(&Snapshot::empty(), &Snapshot::from(line), BASE);
        prop_assert!(extraction.rows.is_empty());
        prop_assert_eq!(extraction.skipped_for(SkipReason::NotAFiling), 1);
    }
}
