use crate::core::append_file::AppendFile;
use crate::core::table::{TableFormat, TableReader};
use crate::domain::model::{LogEntry, LogStatus, LOG_HEADER};
use crate::utils::error::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// 下載進度日誌：每列一行 `position;identifier;status`
#[derive(Debug, Clone)]
pub struct ProgressLog {
    file: AppendFile,
    reader: TableReader,
    delimiter: char,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>, delimiter: char) -> Result<Self> {
        Ok(Self {
            file: AppendFile::new(path, delimiter)?,
            reader: TableReader::new(TableFormat::new(delimiter)),
            delimiter,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn initialize(&self) -> Result<()> {
        tracing::debug!("📝 Initializing progress log at {}", self.path().display());
        self.file.truncate_with(LOG_HEADER)
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        if self.file.is_missing_or_empty() {
            tracing::warn!(
                "⚠️ Progress log {} is missing, starting a new one",
                self.path().display()
            );
            self.initialize()?;
        }
        Ok(())
    }

    pub fn append(&self, entry: &LogEntry) -> Result<()> {
        self.file.append(entry.to_cells())
    }

    /// 解析現有日誌；格式不符的行會略過
    pub fn entries(&self) -> Result<Vec<LogEntry>> {
        let Some(table) = self.reader.try_read_file(self.path())? else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::with_capacity(table.len());
        for cells in table.into_iter().skip(1) {
            match parse_entry(&cells, self.delimiter) {
                Some(entry) => entries.push(entry),
                None => tracing::warn!(
                    "⚠️ Skipping malformed log line: {}",
                    cells.join(self.delimiter.to_string().as_str())
                ),
            }
        }
        Ok(entries)
    }

    /// 任一筆 `OK` 紀錄即視為完成
    pub fn successful_identifiers(&self) -> Result<HashSet<String>> {
        if !self.path().exists() {
            tracing::warn!(
                "⚠️ No progress log at {}, every row is pending",
                self.path().display()
            );
            return Ok(HashSet::new());
        }

        Ok(self
            .entries()?
            .into_iter()
            .filter(|entry| entry.status == LogStatus::Ok)
            .map(|entry| entry.identifier)
            .collect())
    }
}

/// 日誌行不加引號寫入，識別碼內含分隔符號時會被切成多欄；首欄與末欄之間全部屬於識別碼
fn parse_entry(cells: &[String], delimiter: char) -> Option<LogEntry> {
    let [position, identifier @ .., status] = cells else {
        return None;
    };
    if identifier.is_empty() {
        return None;
    }

    Some(LogEntry {
        position: position.trim().parse().ok()?,
        identifier: identifier.join(delimiter.to_string().as_str()),
        status: LogStatus::parse(status)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(position: usize, identifier: &str, status: LogStatus) -> LogEntry {
        LogEntry {
            position,
            identifier: identifier.to_string(),
            status,
        }
    }

    #[test]
    fn test_initialize_writes_header_only() {
        let dir = TempDir::new().unwrap();
        let log = ProgressLog::new(dir.path().join("download_log.csv"), ';').unwrap();

        log.initialize().unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(contents, "index;id;status_code\n");
        assert!(log.entries().unwrap().is_empty());
    }

    #[test]
    fn test_successful_identifiers_uses_set_semantics() {
        let dir = TempDir::new().unwrap();
        let log = ProgressLog::new(dir.path().join("download_log.csv"), ';').unwrap();
        log.initialize().unwrap();

        log.append(&entry(1, "1", LogStatus::Ok)).unwrap();
        log.append(&entry(2, "2", LogStatus::Error)).unwrap();
        log.append(&entry(1, "1", LogStatus::Ok)).unwrap();
        log.append(&entry(3, "3", LogStatus::Error)).unwrap();
        log.append(&entry(3, "3", LogStatus::Ok)).unwrap();

        let done = log.successful_identifiers().unwrap();

        assert_eq!(done.len(), 2);
        assert!(done.contains("1"));
        assert!(done.contains("3"));
        assert!(!done.contains("2"));
    }

    #[test]
    fn test_missing_log_means_nothing_done() {
        let dir = TempDir::new().unwrap();
        let log = ProgressLog::new(dir.path().join("missing.csv"), ';').unwrap();

        assert!(log.successful_identifiers().unwrap().is_empty());
        assert!(log.entries().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("download_log.csv");
        std::fs::write(&path, "index;id;status_code\n1;a;OK\ngarbage\n2;b;200\nx;c;OK\n3;d;ERROR\n").unwrap();
        let log = ProgressLog::new(&path, ';').unwrap();

        let entries = log.entries().unwrap();

        assert_eq!(
            entries,
            vec![entry(1, "a", LogStatus::Ok), entry(3, "d", LogStatus::Error)]
        );
    }

    #[test]
    fn test_identifier_containing_delimiter_is_rejoined() {
        let dir = TempDir::new().unwrap();
        let log = ProgressLog::new(dir.path().join("download_log.csv"), ';').unwrap();
        log.initialize().unwrap();

        log.append(&entry(1, "A;1", LogStatus::Ok)).unwrap();
        log.append(&entry(2, "B;2;x", LogStatus::Error)).unwrap();

        assert_eq!(
            log.entries().unwrap(),
            vec![entry(1, "A;1", LogStatus::Ok), entry(2, "B;2;x", LogStatus::Error)]
        );
        assert!(log.successful_identifiers().unwrap().contains("A;1"));
    }

    #[test]
    fn test_ensure_initialized_keeps_existing_entries() {
        let dir = TempDir::new().unwrap();
        let log = ProgressLog::new(dir.path().join("download_log.csv"), ';').unwrap();

        log.ensure_initialized().unwrap();
        log.append(&entry(1, "a", LogStatus::Ok)).unwrap();
        log.ensure_initialized().unwrap();

        assert_eq!(log.entries().unwrap().len(), 1);
    }
}
