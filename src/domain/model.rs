use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// 附加在成功列後面的四個欄位
pub const ENRICHMENT_COLUMNS: [&str; 4] = ["api_formatted_address", "api_lat", "api_lng", "place_id"];

/// 輸入檔沒有標題列時使用的欄位名稱
pub const DEFAULT_INPUT_COLUMNS: [&str; 2] = ["id", "geoaddress"];

pub const LOG_HEADER: [&str; 3] = ["index", "id", "status_code"];

/// 輸入表格中的一列；第 0 欄為識別碼，第 1 欄為地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 從 1 起算的資料列序號（不含標題列）
    pub index: usize,
    pub cells: Vec<String>,
}

impl Row {
    pub fn new(index: usize, cells: Vec<String>) -> Self {
        Self { index, cells }
    }

    /// 將解析後的表格轉成資料列，必要時丟棄標題列
    pub fn from_table(table: Vec<Vec<String>>, has_header: bool) -> (Option<Vec<String>>, Vec<Row>) {
        let mut lines = table.into_iter();
        let header = if has_header { lines.next() } else { None };
        let rows = lines
            .enumerate()
            .map(|(i, cells)| Row::new(i + 1, cells))
            .collect();
        (header, rows)
    }

    pub fn identifier(&self) -> &str {
        self.cells.first().map(String::as_str).unwrap_or_default()
    }

    pub fn address(&self) -> &str {
        self.cells.get(1).map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub formatted_address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub place_id: String,
}

impl GeocodeResult {
    pub fn to_cells(&self) -> [String; 4] {
        [
            self.formatted_address.clone(),
            self.latitude.to_string(),
            self.longitude.to_string(),
            self.place_id.clone(),
        ]
    }
}

/// 單一地址查詢的結果；`Unresolved` 仍會寫入輸出與日誌
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    Resolved(GeocodeResult),
    Unresolved { reason: String },
}

impl GeocodeOutcome {
    pub fn status(&self) -> LogStatus {
        match self {
            GeocodeOutcome::Resolved(_) => LogStatus::Ok,
            GeocodeOutcome::Unresolved { .. } => LogStatus::Error,
        }
    }

    pub fn result(&self) -> Option<&GeocodeResult> {
        match self {
            GeocodeOutcome::Resolved(result) => Some(result),
            GeocodeOutcome::Unresolved { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub cells: Vec<String>,
}

impl OutputRow {
    pub fn new(row: &Row, result: Option<&GeocodeResult>) -> Self {
        let mut cells = row.cells.clone();
        if let Some(result) = result {
            cells.extend(result.to_cells());
        }
        Self { cells }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogStatus {
    Ok,
    Error,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Ok => "OK",
            LogStatus::Error => "ERROR",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "OK" => Some(LogStatus::Ok),
            "ERROR" => Some(LogStatus::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub position: usize,
    pub identifier: String,
    pub status: LogStatus,
}

impl LogEntry {
    pub fn to_cells(&self) -> [String; 3] {
        [
            self.position.to_string(),
            self.identifier.clone(),
            self.status.as_str().to_string(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// 重設輸出與日誌，處理全部資料列
    FreshStart,
    /// 依日誌略過已成功的識別碼
    Resume,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::FreshStart => write!(f, "fresh start"),
            RunMode::Resume => write!(f, "resume"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub mode: RunMode,
    pub rows_read: usize,
    pub pending: usize,
    pub batches: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            rows_read: 0,
            pending: 0,
            batches: 0,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record(&mut self, status: LogStatus) {
        self.attempted += 1;
        match status {
            LogStatus::Ok => self.succeeded += 1,
            LogStatus::Error => self.failed += 1,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}
