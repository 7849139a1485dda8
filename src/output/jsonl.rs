//! JSON Lines writer
//!
//! One UTF-8 JSON object per line. Each line is flushed as soon as it is
//! written, so an interrupted crawl leaves only complete records behind.

use crate::output::traits::{OutputError, OutputResult, RecordSink, WriteOutcome};
use crate::record::Company;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes company records as JSON Lines to any `Write`
pub struct JsonlWriter<W: Write> {
    writer: W,
    written: u64,
}

impl JsonlWriter<BufWriter<File>> {
    /// Creates (or truncates) the file at `path`
    pub fn create(path: &Path) -> OutputResult<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Returns the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonlWriter<W> {
    fn write_record(&mut self, company: &Company) -> OutputResult<WriteOutcome> {
        let line = serde_json::to_string(company).map_err(|source| OutputError::Serialize {
            url: company.detail_url.clone(),
            source,
        })?;

        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.written += 1;

        Ok(WriteOutcome::Written)
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        tracing::debug!("JSON Lines output closed after {} lines", self.written);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn company(url: &str, name: &str) -> Company {
        Company {
            name: name.to_string(),
            phones: vec!["+237 6 00".to_string()],
            localisation: "Situé à Akwa, Douala".to_string(),
            detail_url: url.to_string(),
            ..Company::default()
        }
    }

    #[test]
    fn test_one_object_per_line() {
        let mut writer = JsonlWriter::new(Vec::new());
        writer.write_record(&company("https://x/1", "Acme")).unwrap();
        writer.write_record(&company("https://x/2", "Béta")).unwrap();
        writer.finish().unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(text.ends_with('\n'));

        let second: Company = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.name, "Béta");
        assert_eq!(second.localisation, "Situé à Akwa, Douala");
    }

    #[test]
    fn test_non_ascii_written_as_utf8() {
        let mut writer = JsonlWriter::new(Vec::new());
        writer.write_record(&company("https://x/1", "Société Générale")).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert!(text.contains("Société Générale"));
    }

    #[test]
    fn test_create_truncates_existing_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "stale line from an earlier run\n").unwrap();

        let mut writer = JsonlWriter::create(file.path()).unwrap();
        writer.write_record(&company("https://x/1", "A")).unwrap();
        writer.write_record(&company("https://x/2", "B")).unwrap();
        writer.finish().unwrap();
        drop(writer);

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(!content.contains("stale"));
    }
}
