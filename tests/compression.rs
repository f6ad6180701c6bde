//! Splitting compressed inputs. Outputs are always plain CSV.

#[cfg(any(feature = "compression-gzip", feature = "compression-zstd"))]
mod compressed_inputs {
    use datashear::testing::*;
    use datashear::*;
    use std::fs;
    use std::io::Write;

    fn plain_csv(ws: &CsvWorkspace, rows: &[Vec<String>]) -> anyhow::Result<Vec<u8>> {
        let path = ws.write_csv("plain.csv", &people_header(), rows)?;
        Ok(fs::read(path)?)
    }

    #[cfg(feature = "compression-gzip")]
    fn gzip(bytes: &[u8]) -> anyhow::Result<Vec<u8>> {
        use flate2::Compression;
        use flate2::write::GzEncoder;

        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(bytes)?;
        Ok(enc.finish()?)
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn test_gzip_input_by_extension() -> anyhow::Result<()> {
        let ws = CsvWorkspace::new()?;
        let rows = people_rows(9);
        let input = ws.write_raw("people.csv.gz", gzip(&plain_csv(&ws, &rows)?)?)?;

        let summary = Splitter::new(&input, ws.path().join("out"))?
            .run(SplitPolicy::by_row_count(4)?)?;

        assert_row_counts(&summary, &[4, 4, 1]);
        assert_partition(&summary, &rows)?;
        assert_eq!(
            summary.files[0].path,
            ws.path().join("out").join("people_part_1.csv")
        );
        Ok(())
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn test_gzip_input_by_magic_bytes() -> anyhow::Result<()> {
        let ws = CsvWorkspace::new()?;
        let rows = people_rows(3);
        let input = ws.write_raw("people.dat", gzip(&plain_csv(&ws, &rows)?)?)?;

        assert_eq!(count_data_rows(&input, &SplitOptions::default())?, 3);
        Ok(())
    }

    #[cfg(feature = "compression-zstd")]
    #[test]
    fn test_zstd_input_by_size() -> anyhow::Result<()> {
        let ws = CsvWorkspace::new()?;
        let rows = people_rows(200);
        let compressed = zstd::encode_all(plain_csv(&ws, &rows)?.as_slice(), 3)?;
        let input = ws.write_raw("people.csv.zst", compressed)?;

        let summary = Splitter::new(&input, ws.path().join("out"))?
            .run(SplitPolicy::by_byte_size(512)?)?;

        assert!(summary.files.iter().all(|f| f.bytes <= 512));
        assert_partition(&summary, &rows)?;
        Ok(())
    }
}

#[test]
fn test_signature_lookalike_header_is_plain_csv() -> anyhow::Result<()> {
    use datashear::testing::*;

    let ws = CsvWorkspace::new()?;
    let input = ws.write_raw("plain.csv", "BZh_code,name\n1,a\n2,b\n")?;

    let parts = datashear::split_by_row_count(&input, 1, true)?;

    assert_eq!(parts.len(), 2);
    assert_eq!(read_records(&parts[0])?, [["BZh_code", "name"], ["1", "a"]]);
    assert_eq!(read_records(&parts[1])?, [["BZh_code", "name"], ["2", "b"]]);
    Ok(())
}
