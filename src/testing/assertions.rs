//! Read split outputs back and compare them with the input.

use crate::engine::SplitSummary;
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::path::Path;

/// Every record of a CSV file, header included, as owned strings.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_records(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec.with_context(|| format!("read {}", path.display()))?;
        out.push(rec.iter().map(String::from).collect());
    }
    Ok(out)
}

/// The data rows of every output file in order, headers skipped.
///
/// # Errors
/// Returns an error if any output cannot be read.
pub fn collect_data_rows(summary: &SplitSummary) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    for file in &summary.files {
        let records = read_records(&file.path)?;
        let skip = usize::from(file.has_header);
        rows.extend(records.into_iter().skip(skip));
    }
    Ok(rows)
}

/// Assert that the outputs, concatenated in order, hold exactly `expected`.
///
/// # Errors
/// Returns an error if any output cannot be read.
///
/// # Panics
/// Panics if a row is missing, duplicated or out of order.
pub fn assert_partition<S: AsRef<str>>(summary: &SplitSummary, expected: &[Vec<S>]) -> Result<()> {
    let actual = collect_data_rows(summary)?;
    assert_eq!(
        actual.len(),
        expected.len(),
        "row count mismatch across {} output files",
        summary.files.len()
    );
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        let e: Vec<&str> = e.iter().map(AsRef::<str>::as_ref).collect();
        assert_eq!(a, &e, "row {i} differs");
    }
    Ok(())
}

/// Assert the number of data rows in each output file.
///
/// # Panics
/// Panics if the per-file counts differ from `expected`.
pub fn assert_row_counts(summary: &SplitSummary, expected: &[u64]) {
    let actual: Vec<u64> = summary.files.iter().map(|f| f.rows).collect();
    assert_eq!(actual, expected, "rows per output file");
}

/// Assert that each output starts with `header` exactly when it is marked as
/// carrying it.
///
/// # Errors
/// Returns an error if any output cannot be read.
///
/// # Panics
/// Panics if a file's first record disagrees with its `has_header` flag.
pub fn assert_headers<S: AsRef<str>>(summary: &SplitSummary, header: &[S]) -> Result<()> {
    let header: Vec<&str> = header.iter().map(AsRef::<str>::as_ref).collect();
    for file in &summary.files {
        let records = read_records(&file.path)?;
        let starts_with_header = records.first().is_some_and(|r| *r == header);
        assert_eq!(
            starts_with_header,
            file.has_header,
            "header presence in {}",
            file.path.display()
        );
    }
    Ok(())
}
