use anyhow::Result;
use foldset::io::compression::{
    CompressionCodec, FinishWrite, auto_detect_reader, auto_detect_writer, codec_for_path,
    is_available, register_codec,
};
use foldset::StructureRecord;
use foldset::io::json::{read_json, read_jsonl_vec, write_json, write_jsonl_vec};
use foldset::testing::record_fixture;
use std::io::{Read, Write};
use std::sync::Arc;

/// Upper-cases ASCII on write; reads pass through.
struct UpperCodec;

impl CompressionCodec for UpperCodec {
    fn name(&self) -> &str {
        "upper"
    }

    fn extensions(&self) -> &[&str] {
        &[".upper"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        None
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        Ok(reader)
    }

    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn FinishWrite>> {
        Ok(Box::new(UpperWriter(writer)))
    }
}

struct UpperWriter(Box<dyn Write>);

impl Write for UpperWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.write_all(&buf.to_ascii_uppercase())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()
    }
}

impl FinishWrite for UpperWriter {
    fn finish_stream(mut self: Box<Self>) -> std::io::Result<()> {
        self.0.flush()
    }
}

/// Accepts every write but fails to write its trailer.
struct BrokenTrailerCodec;

impl CompressionCodec for BrokenTrailerCodec {
    fn name(&self) -> &str {
        "broken-trailer"
    }

    fn extensions(&self) -> &[&str] {
        &[".broken"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        None
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        Ok(reader)
    }

    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn FinishWrite>> {
        Ok(Box::new(BrokenTrailerWriter(writer)))
    }
}

struct BrokenTrailerWriter(Box<dyn Write>);

impl Write for BrokenTrailerWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()
    }
}

impl FinishWrite for BrokenTrailerWriter {
    fn finish_stream(self: Box<Self>) -> std::io::Result<()> {
        Err(std::io::Error::other("disk full while writing trailer"))
    }
}

#[test]
fn test_registered_codec_is_used() -> Result<()> {
    register_codec(Arc::new(UpperCodec));
    assert!(is_available("upper"));
    assert!(codec_for_path("ids.txt.upper").is_some());

    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("ids.txt.upper");
    {
        let mut w = auto_detect_writer(std::fs::File::create(&path)?, &path)?;
        w.write_all(b"1abc\n2xyz\n")?;
        w.finish_stream()?;
    }
    assert_eq!(std::fs::read_to_string(&path)?, "1ABC\n2XYZ\n");
    Ok(())
}

#[test]
fn test_failed_trailer_is_reported() -> Result<()> {
    register_codec(Arc::new(BrokenTrailerCodec));
    let tmp = tempfile::tempdir()?;
    let record = record_fixture("1ABC", &[3], None);

    let err = write_json(tmp.path().join("1ABC.json.broken"), &record).unwrap_err();
    assert!(format!("{err:#}").contains("disk full"));

    let err = write_jsonl_vec(tmp.path().join("rows.jsonl.broken"), &[record]).unwrap_err();
    assert!(format!("{err:#}").contains("disk full"));
    Ok(())
}

#[test]
fn test_plain_files_pass_through() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("plain.json");
    let record = record_fixture("1ABC", &[3], None);

    write_json(&path, &record)?;

    let text = std::fs::read_to_string(&path)?;
    assert!(text.starts_with('{'));
    let back: StructureRecord = read_json(&path)?;
    assert_eq!(back, record);
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn test_gzip_detected_by_magic_bytes() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let gz_path = tmp.path().join("record.json.gz");
    let record = record_fixture("2XYZ", &[4, 2], Some(1.5));
    write_json(&gz_path, &record)?;

    // Same bytes under a name with no compression suffix.
    let renamed = tmp.path().join("record.bin");
    std::fs::rename(&gz_path, &renamed)?;

    let mut text = String::new();
    auto_detect_reader(std::fs::File::open(&renamed)?, &renamed)?.read_to_string(&mut text)?;
    let back: StructureRecord = serde_json::from_str(&text)?;
    assert_eq!(back, record);
    Ok(())
}

#[cfg(feature = "compression-zstd")]
#[test]
fn test_zstd_jsonl_round_trip() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("records.jsonl.zst");
    let records = vec![
        record_fixture("1ABC", &[3], None),
        record_fixture("2XYZ", &[2, 2], Some(2.0)),
    ];

    let n = write_jsonl_vec(&path, &records)?;
    assert_eq!(n, 2);

    let magic = std::fs::read(&path)?;
    assert_eq!(&magic[..4], &[0x28, 0xb5, 0x2f, 0xfd]);
    let back: Vec<StructureRecord> = read_jsonl_vec(&path)?;
    assert_eq!(back, records);
    Ok(())
}

#[test]
fn test_unknown_extension_has_no_codec() {
    assert!(codec_for_path("metadata.parquet").is_none());
    assert!(!is_available("lz4"));
}
