use crate::core::append_file::AppendFile;
use crate::domain::model::OutputRow;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ResultWriter {
    file: AppendFile,
}

impl ResultWriter {
    pub fn new(path: impl Into<PathBuf>, delimiter: char) -> Result<Self> {
        Ok(Self {
            file: AppendFile::new(path, delimiter)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn initialize(&self, header: &[String]) -> Result<()> {
        tracing::debug!("📝 Initializing output file at {}", self.path().display());
        self.file.truncate_with(header)
    }

    pub fn ensure_initialized(&self, header: &[String]) -> Result<()> {
        if self.file.is_missing_or_empty() {
            tracing::warn!(
                "⚠️ Output file {} is missing, writing a new header",
                self.path().display()
            );
            self.initialize(header)?;
        }
        Ok(())
    }

    pub fn append(&self, row: &OutputRow) -> Result<()> {
        self.file.append(&row.cells)
    }
}
