//! Integration tests for byte-size splitting.
//!
//! Outputs use the default CRLF terminator, so a row of `n` single-byte
//! characters in one field encodes to `n + 2` bytes.

use datashear::testing::*;
use datashear::*;
use std::fs;

fn one_column(rows: impl IntoIterator<Item = String>) -> Vec<Vec<String>> {
    rows.into_iter().map(|r| vec![r]).collect()
}

fn assert_sizes_on_disk(summary: &SplitSummary) -> anyhow::Result<()> {
    for file in &summary.files {
        assert_eq!(fs::metadata(&file.path)?.len(), file.bytes, "{}", file.path.display());
    }
    Ok(())
}

#[test]
fn test_fifty_byte_rows_under_120() -> anyhow::Result<()> {
    let ws = CsvWorkspace::new()?;
    // "h\r\n" = 3 bytes; each row is 48 characters + CRLF = 50 bytes
    let rows = one_column((0..4).map(|i| format!("{i:02}{}", "x".repeat(46))));
    let input = ws.write_csv("fifty.csv", &["h"], &rows)?;

    let summary = Splitter::new(&input, ws.path().join("out"))?
        .run(SplitPolicy::by_byte_size(120)?)?;

    assert_row_counts(&summary, &[2, 2]);
    assert!(summary.files.iter().all(|f| f.bytes == 103));
    assert_partition(&summary, &rows)?;
    assert_sizes_on_disk(&summary)?;
    Ok(())
}

#[test]
fn test_header_counts_toward_each_budget() -> anyhow::Result<()> {
    let ws = CsvWorkspace::new()?;
    // header "header_col\r\n" = 12 bytes, rows "rowNNNNN\r\n" = 10 bytes
    let rows = one_column((0..6).map(|i| format!("row{i:05}")));
    let input = ws.write_csv("rows.csv", &["header_col"], &rows)?;

    let repeated = Splitter::new(&input, ws.path().join("repeated"))?
        .run(SplitPolicy::by_byte_size(32)?)?;
    assert_row_counts(&repeated, &[2, 2, 2]);
    assert_headers(&repeated, &["header_col"])?;

    let first_only = Splitter::new(&input, ws.path().join("first_only"))?
        .with_options(SplitOptions::default().with_repeat_header(false))
        .run(SplitPolicy::by_byte_size(32)?)?;
    // file #1 pays for the header; later files fit one more row
    assert_row_counts(&first_only, &[2, 3, 1]);
    assert_headers(&first_only, &["header_col"])?;
    assert_partition(&first_only, &rows)?;

    for summary in [&repeated, &first_only] {
        assert!(summary.files.iter().all(|f| f.bytes <= 32));
        assert_sizes_on_disk(summary)?;
    }
    Ok(())
}

#[test]
fn test_oversize_row_gets_its_own_file() -> anyhow::Result<()> {
    let ws = CsvWorkspace::new()?;
    let rows = one_column(["a".to_string(), "z".repeat(100), "b".to_string()]);
    let input = ws.write_csv("big.csv", &["h"], &rows)?;

    let summary = Splitter::new(&input, ws.path().join("out"))?
        .run(SplitPolicy::by_byte_size(20)?)?;

    assert_row_counts(&summary, &[1, 1, 1]);
    assert_eq!(summary.files[1].bytes, 3 + 102);
    let within: Vec<bool> = summary.files.iter().map(|f| f.bytes <= 20).collect();
    assert_eq!(within, [true, false, true]);
    assert_partition(&summary, &rows)?;
    Ok(())
}

#[test]
fn test_header_larger_than_limit_is_still_written() -> anyhow::Result<()> {
    let ws = CsvWorkspace::new()?;
    let header = ["a_very_long_header_name_over_the_limit"];
    let rows = one_column(["1".to_string(), "2".to_string()]);
    let input = ws.write_csv("wide.csv", &header, &rows)?;

    let summary = Splitter::new(&input, ws.path().join("out"))?
        .run(SplitPolicy::by_byte_size(10)?)?;

    // each file holds the header plus exactly one row
    assert_row_counts(&summary, &[1, 1]);
    assert_headers(&summary, &header)?;
    assert_partition(&summary, &rows)?;
    Ok(())
}

#[test]
fn test_quoting_is_part_of_the_measured_size() -> anyhow::Result<()> {
    let ws = CsvWorkspace::new()?;
    let rows = awkward_rows();
    let input = ws.write_csv("awkward.csv", &["id", "a", "b"], &rows)?;
    let codec = CsvRecordCodec::default();
    let header_bytes = codec.measure(["id", "a", "b"])?;

    let summary = Splitter::new(&input, ws.path().join("out"))?
        .run(SplitPolicy::by_byte_size(40)?)?;

    assert_partition(&summary, &rows)?;
    assert_sizes_on_disk(&summary)?;
    let mut expected_total = 0;
    for row in &rows {
        expected_total += codec.measure(row)?;
    }
    expected_total += header_bytes * summary.files.len() as u64;
    assert_eq!(summary.bytes, expected_total);
    Ok(())
}

#[test]
fn test_large_input_partition() -> anyhow::Result<()> {
    let ws = CsvWorkspace::new()?;
    let rows = people_rows(5_000);
    let input = ws.write_csv("people.csv", &people_header(), &rows)?;

    let summary = Splitter::new(&input, ws.path().join("out"))?
        .run(SplitPolicy::by_byte_size(4_096)?)?;

    assert!(summary.files.len() > 1);
    assert!(summary.files.iter().all(|f| f.bytes <= 4_096));
    assert_partition(&summary, &rows)?;
    assert_headers(&summary, &people_header())?;
    assert_sizes_on_disk(&summary)?;
    Ok(())
}

#[test]
fn test_free_function_writes_next_to_input() -> anyhow::Result<()> {
    let ws = CsvWorkspace::new()?;
    let input = ws.write_csv("people.csv", &people_header(), &people_rows(20))?;

    let parts = split_by_byte_size(&input, 200, false)?;

    assert!(parts.len() > 1);
    for part in &parts {
        assert_eq!(part.parent(), Some(ws.path()));
    }
    assert_eq!(read_records(&parts[0])?[0], people_header());
    assert_ne!(read_records(&parts[1])?[0], people_header());
    Ok(())
}
