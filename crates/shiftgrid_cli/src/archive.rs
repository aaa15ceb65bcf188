//! Zip packaging of the week workbooks.

use std::collections::BTreeMap;
use std::io::{Seek, Write};

use anyhow::{Context, Result};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Write one deflated entry per workbook, in file-name order.
///
/// The writer is flushed before it is returned, so buffered write errors
/// surface here instead of being lost on drop.
pub fn write_archive<W: Write + Seek>(
    writer: W,
    workbooks: &BTreeMap<String, Vec<u8>>,
) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (file_name, v_bytes) in workbooks {
        zip.start_file(file_name.as_str(), options)
            .with_context(|| format!("failed to add {file_name} to archive"))?;
        zip.write_all(v_bytes)
            .with_context(|| format!("failed to write {file_name} to archive"))?;
    }
    let mut writer = zip.finish().context("failed to finalize archive")?;
    writer.flush().context("failed to flush archive")?;
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use std::io::{BufWriter, Cursor, Read, SeekFrom};

    use zip::ZipArchive;

    use super::*;

    #[test]
    fn write_archive_keeps_name_order_and_bytes() {
        let mut workbooks = BTreeMap::new();
        workbooks.insert("Week 11.xlsx".to_string(), vec![4, 5]);
        workbooks.insert("Week 10.xlsx".to_string(), vec![1, 2, 3]);

        let cursor = write_archive(Cursor::new(Vec::new()), &workbooks).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();

        assert_eq!(archive.len(), 2);
        assert_eq!(archive.by_index(0).unwrap().name(), "Week 10.xlsx");
        let mut v_bytes = Vec::new();
        archive
            .by_name("Week 11.xlsx")
            .unwrap()
            .read_to_end(&mut v_bytes)
            .unwrap();
        assert_eq!(v_bytes, vec![4, 5]);
    }

    /// Accepts writes, refuses to flush.
    #[derive(Debug)]
    struct FlushFailingSink(Cursor<Vec<u8>>);

    impl Write for FlushFailingSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("disk full"))
        }
    }

    impl Seek for FlushFailingSink {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            self.0.seek(pos)
        }
    }

    #[test]
    fn write_archive_reports_flush_failure() {
        let mut workbooks = BTreeMap::new();
        workbooks.insert("Week 10.xlsx".to_string(), vec![1, 2, 3]);

        let writer = BufWriter::new(FlushFailingSink(Cursor::new(Vec::new())));
        let err = write_archive(writer, &workbooks).unwrap_err();
        assert!(format!("{err:#}").contains("disk full"));
    }
}
