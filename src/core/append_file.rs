use crate::utils::error::{GeocodeError, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// 逐行附加的分隔文字檔
///
/// 每一行先在記憶體中完整編碼，再以單次 `write_all` 寫入並 `sync_data`，
/// 中斷時檔案只會包含完整的紀錄行。
#[derive(Debug, Clone)]
pub struct AppendFile {
    path: PathBuf,
    delimiter: u8,
}

impl AppendFile {
    pub fn new(path: impl Into<PathBuf>, delimiter: char) -> Result<Self> {
        let delimiter = u8::try_from(delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| GeocodeError::InvalidConfigValueError {
                field: "files.delimiter".to_string(),
                value: delimiter.to_string(),
                reason: "Delimiter must be a single ASCII character".to_string(),
            })?;

        Ok(Self {
            path: path.into(),
            delimiter,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode_line<I, T>(&self, cells: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .flexible(true)
            .has_headers(false)
            .from_writer(Vec::new());

        writer.write_record(cells)?;
        writer
            .into_inner()
            .map_err(|e| GeocodeError::IoError(e.into_error()))
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    /// 清空（或建立）檔案，只留下一行標題
    pub fn truncate_with<I, T>(&self, header: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let line = self.encode_line(header)?;
        self.ensure_parent()?;

        let mut file = File::create(&self.path)?;
        file.write_all(&line)?;
        file.sync_data()?;
        Ok(())
    }

    pub fn append<I, T>(&self, cells: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let line = self.encode_line(cells)?;
        self.ensure_parent()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;
        file.flush()?;
        file.sync_data()?;
        Ok(())
    }

    pub fn is_missing_or_empty(&self) -> bool {
        fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_truncate_then_append() {
        let dir = TempDir::new().unwrap();
        let file = AppendFile::new(dir.path().join("nested/out.csv"), ';').unwrap();

        assert!(file.is_missing_or_empty());
        file.truncate_with(["index", "id", "status_code"]).unwrap();
        file.append(["1", "a", "OK"]).unwrap();
        file.append(["2", "b", "ERROR"]).unwrap();

        let contents = fs::read_to_string(file.path()).unwrap();
        assert_eq!(contents, "index;id;status_code\n1;a;OK\n2;b;ERROR\n");
        assert!(!file.is_missing_or_empty());
    }

    #[test]
    fn test_truncate_discards_previous_lines() {
        let dir = TempDir::new().unwrap();
        let file = AppendFile::new(dir.path().join("log.csv"), ';').unwrap();

        file.truncate_with(["h"]).unwrap();
        file.append(["old"]).unwrap();
        file.truncate_with(["h"]).unwrap();

        assert_eq!(fs::read_to_string(file.path()).unwrap(), "h\n");
    }

    #[test]
    fn test_cells_are_written_verbatim() {
        let dir = TempDir::new().unwrap();
        let file = AppendFile::new(dir.path().join("out.csv"), ';').unwrap();

        file.append(["1", "10 Main St, CA", "\"quoted\""]).unwrap();

        assert_eq!(
            fs::read_to_string(file.path()).unwrap(),
            "1;10 Main St, CA;\"quoted\"\n"
        );
    }

    #[test]
    fn test_rejects_non_ascii_delimiter() {
        assert!(AppendFile::new("out.csv", '§').is_err());
    }
}
