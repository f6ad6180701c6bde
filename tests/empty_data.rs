//! Header-only inputs under each `EmptyDataPolicy`.

use datashear::testing::*;
use datashear::*;

fn header_only(ws: &CsvWorkspace) -> anyhow::Result<std::path::PathBuf> {
    ws.write_csv::<_, String>("header_only.csv", &people_header(), &[])
}

#[test]
fn test_no_output_by_default() -> anyhow::Result<()> {
    let ws = CsvWorkspace::new()?;
    let input = header_only(&ws)?;
    let out = ws.path().join("out");

    let summary = Splitter::new(&input, &out)?.run(SplitPolicy::by_row_count(10)?)?;

    assert!(summary.files.is_empty());
    assert_eq!(summary.rows, 0);
    assert_eq!(std::fs::read_dir(&out)?.count(), 0);
    Ok(())
}

#[test]
fn test_header_only_file() -> anyhow::Result<()> {
    let ws = CsvWorkspace::new()?;
    let input = header_only(&ws)?;
    let options = SplitOptions::default().with_empty_data(EmptyDataPolicy::HeaderOnlyFile);

    for policy in [SplitPolicy::by_row_count(10)?, SplitPolicy::by_byte_size(5)?] {
        let out = ws.path().join(policy.to_string().replace(' ', "_"));
        let summary = Splitter::new(&input, &out)?
            .with_options(options.clone())
            .run(policy)?;

        assert_row_counts(&summary, &[0]);
        assert!(summary.files[0].has_header);
        assert_eq!(read_records(&summary.files[0].path)?, [people_header()]);
    }
    Ok(())
}

#[test]
fn test_file_count_rejects_header_only() -> anyhow::Result<()> {
    let ws = CsvWorkspace::new()?;
    let input = header_only(&ws)?;

    let err = Splitter::new(&input, ws.path())?.by_file_count(3, true).unwrap_err();

    assert!(matches!(err, SplitError::NoDataRows { .. }));
    Ok(())
}

#[test]
fn test_blank_lines_only_after_header() -> anyhow::Result<()> {
    let ws = CsvWorkspace::new()?;
    let input = ws.write_raw("blank.csv", "a,b\n\n\n")?;

    let summary = Splitter::new(&input, ws.path().join("out"))?.run(SplitPolicy::by_row_count(1)?)?;

    assert_eq!(summary.rows, 0);
    assert!(summary.files.is_empty());
    Ok(())
}
