//! Integration tests for record encoding and measurement.

use datashear::testing::awkward_rows;
use datashear::*;

#[test]
fn test_measure_matches_encode_for_awkward_rows() -> anyhow::Result<()> {
    for dialect in [
        Dialect::default(),
        Dialect::default().with_terminator(LineTerminator::Lf),
        Dialect::default().with_delimiter(';'),
        Dialect::default().with_delimiter('\t').with_quote('\''),
    ] {
        let codec = CsvRecordCodec::new(&dialect)?;
        for row in awkward_rows() {
            let encoded = codec.encode(&row)?;
            assert_eq!(codec.measure(&row)?, encoded.len() as u64, "{row:?} with {dialect:?}");
            assert_eq!(codec.encode(&row)?, encoded, "encode is deterministic");
        }
    }
    Ok(())
}

#[test]
fn test_quoting_rules() -> anyhow::Result<()> {
    let codec = CsvRecordCodec::default();
    assert_eq!(codec.encode(["a", "b"])?, b"a,b\r\n");
    assert_eq!(codec.encode(["a,b", "c"])?, b"\"a,b\",c\r\n");
    assert_eq!(codec.encode(["say \"hi\""])?, b"\"say \"\"hi\"\"\"\r\n");
    assert_eq!(codec.encode(["two\nlines"])?, b"\"two\nlines\"\r\n");
    Ok(())
}

#[test]
fn test_multibyte_text_is_measured_in_bytes() -> anyhow::Result<()> {
    let codec = CsvRecordCodec::default();
    // 3 characters of 3 bytes each, a comma and CRLF
    assert_eq!(codec.measure(["日本語", ""])?, 9 + 1 + 2);
    Ok(())
}

#[test]
fn test_dialect_must_be_usable() {
    let err = CsvRecordCodec::new(&Dialect::default().with_delimiter('"')).unwrap_err();
    assert!(matches!(err, SplitError::InvalidDialect { .. }));
}
