use crate::utils::error::Result;
use std::io::ErrorKind;
use std::path::Path;

/// 分隔字元與可選的文字引號，輸入、輸出、日誌三種檔案共用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFormat {
    pub delimiter: char,
    pub quote: Option<char>,
}

impl TableFormat {
    pub fn new(delimiter: char) -> Self {
        Self {
            delimiter,
            quote: None,
        }
    }

    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = Some(quote);
        self
    }
}

impl Default for TableFormat {
    fn default() -> Self {
        Self::new(';')
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TableReader {
    format: TableFormat,
}

impl TableReader {
    pub fn new(format: TableFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> TableFormat {
        self.format
    }

    /// 將文字切成非空白行，再依分隔字元切成欄位
    pub fn parse(&self, text: &str) -> Vec<Vec<String>> {
        text.lines()
            .filter(|line| !line.is_empty())
            .map(|line| self.parse_line(line))
            .collect()
    }

    fn parse_line(&self, line: &str) -> Vec<String> {
        let delimiter = self.format.delimiter;

        let Some(quote) = self.format.quote else {
            return line.split(delimiter).map(str::to_string).collect();
        };

        // 最後一欄缺漏時補上一個空的引號欄位
        let padded = if line.ends_with(delimiter) {
            format!("{}{}{}", line, quote, quote)
        } else {
            line.to_string()
        };

        let separator = format!("{}{}{}", quote, delimiter, quote);
        padded
            .split(separator.as_str())
            .map(|cell| {
                let collapsed = collapse_whitespace(cell);
                let trimmed = collapsed.strip_prefix(quote).unwrap_or(collapsed.as_str());
                let trimmed = trimmed.strip_suffix(quote).unwrap_or(trimmed);
                trimmed.to_string()
            })
            .collect()
    }

    /// 讀取並解析檔案；檔案不存在時回傳 `Ok(None)`
    pub fn try_read_file(&self, path: impl AsRef<Path>) -> Result<Option<Vec<Vec<String>>>> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(text) => Ok(Some(self.parse(&text))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 與 `try_read_file` 相同，但任何讀取問題只回報並回傳空表格
    pub fn read_file(&self, path: impl AsRef<Path>) -> Vec<Vec<String>> {
        let path = path.as_ref();
        match self.try_read_file(path) {
            Ok(Some(table)) => {
                tracing::debug!("📂 Parsed {} lines from {}", table.len(), path.display());
                table
            }
            Ok(None) => {
                tracing::error!("❌ ERROR: {} file NOT found!", path.display());
                Vec::new()
            }
            Err(e) => {
                tracing::error!("❌ Failed to read {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }
}

fn collapse_whitespace(value: &str) -> String {
    let mut collapsed = String::with_capacity(value.len());
    let mut in_whitespace = false;

    for ch in value.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                collapsed.push(' ');
            }
            in_whitespace = true;
        } else {
            collapsed.push(ch);
            in_whitespace = false;
        }
    }

    collapsed
}
