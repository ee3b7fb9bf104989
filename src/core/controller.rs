use crate::config::BatchConfig;
use crate::core::progress_log::ProgressLog;
use crate::core::result_writer::ResultWriter;
use crate::core::table::TableReader;
use crate::domain::model::{
    GeocodeOutcome, LogEntry, OutputRow, Row, RunMode, RunSummary, DEFAULT_INPUT_COLUMNS,
    ENRICHMENT_COLUMNS,
};
use crate::domain::ports::Geocoder;
use crate::utils::error::Result;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::ops::Range;

/// 依批次把工作集切成連續區間；批次大小只影響節流
pub fn plan_batches(len: usize, batch_size: usize) -> Vec<Range<usize>> {
    let size = batch_size.max(1);
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}

/// 尚未在日誌中標記為 OK 的資料列，保持輸入順序
pub fn pending_rows(rows: Vec<Row>, done: &HashSet<String>) -> Vec<Row> {
    rows.into_iter()
        .filter(|row| !done.contains(row.identifier()))
        .collect()
}

/// 輸出標題 = 輸入標題（或預設欄名）加上四個查詢欄位
pub fn output_header(input_header: Option<Vec<String>>) -> Vec<String> {
    let mut header = input_header
        .unwrap_or_else(|| DEFAULT_INPUT_COLUMNS.iter().map(|c| c.to_string()).collect());
    header.extend(ENRICHMENT_COLUMNS.iter().map(|c| c.to_string()));
    header
}

/// 可續傳的批次下載控制器
pub struct BatchController<G: Geocoder> {
    geocoder: G,
    config: BatchConfig,
    reader: TableReader,
    writer: ResultWriter,
    log: ProgressLog,
}

impl<G: Geocoder> BatchController<G> {
    pub fn new(geocoder: G, config: BatchConfig) -> Result<Self> {
        let reader = TableReader::new(config.table_format());
        let writer = ResultWriter::new(&config.output_path, config.delimiter)?;
        let log = ProgressLog::new(&config.log_path, config.delimiter)?;

        Ok(Self {
            geocoder,
            config,
            reader,
            writer,
            log,
        })
    }

    pub fn progress_log(&self) -> &ProgressLog {
        &self.log
    }

    pub async fn run(&self, mode: RunMode) -> Result<RunSummary> {
        let mut summary = RunSummary::new(mode);
        tracing::info!("🚀 Starting {} run", mode);

        let table = self.reader.read_file(&self.config.input_path);
        let (input_header, rows) = Row::from_table(table, self.config.has_header);
        summary.rows_read = rows.len();
        let header = output_header(input_header);

        let work = match mode {
            RunMode::FreshStart => {
                self.writer.initialize(&header)?;
                self.log.initialize()?;
                rows
            }
            RunMode::Resume => {
                self.writer.ensure_initialized(&header)?;
                self.log.ensure_initialized()?;
                let done = self.log.successful_identifiers()?;
                tracing::info!("📂 {} ids already logged as OK", done.len());
                pending_rows(rows, &done)
            }
        };

        let total = work.len();
        summary.pending = total;
        let batches = plan_batches(total, self.config.batch_size);
        summary.batches = batches.len();
        tracing::info!(
            "📦 {} of {} rows pending, {} batches of up to {}",
            total,
            summary.rows_read,
            batches.len(),
            self.config.batch_size
        );

        for (batch_no, range) in batches.into_iter().enumerate() {
            tracing::debug!(
                "📦 Batch {}/{}: positions {}..={}",
                batch_no + 1,
                summary.batches,
                range.start + 1,
                range.end
            );
            let offset = range.start;
            let batch = &work[range];

            if self.config.concurrent_requests > 1 {
                self.process_batch_joined(offset, batch, total, &mut summary)
                    .await;
            } else {
                self.process_batch_sequential(offset, batch, total, &mut summary)
                    .await;
            }
        }

        summary.finish();
        tracing::info!(
            "✅ Run finished: {} attempted, {} OK, {} ERROR, {} skipped",
            summary.attempted,
            summary.succeeded,
            summary.failed,
            summary.skipped
        );
        Ok(summary)
    }

    /// 一次只有一個請求，每列之後暫停
    async fn process_batch_sequential(
        &self,
        offset: usize,
        batch: &[Row],
        total: usize,
        summary: &mut RunSummary,
    ) {
        for (index, row) in batch.iter().enumerate() {
            let position = offset + index + 1;
            let result = self.geocoder.geocode(row.address()).await;
            self.record_outcome(position, total, row, result, summary);

            if position < total {
                self.pause().await;
            }
        }
    }

    /// 批次內以有限並行發出請求，依工作集順序寫入，整批完成後才進入下一批
    async fn process_batch_joined(
        &self,
        offset: usize,
        batch: &[Row],
        total: usize,
        summary: &mut RunSummary,
    ) {
        let geocoder = &self.geocoder;
        let delay = self.config.request_delay;

        // 依批內序號錯開發送時間，維持與逐列模式相同的請求速率
        let mut outcomes = stream::iter(batch.iter().enumerate())
            .map(|(index, row)| async move {
                let stagger = delay * index as u32;
                if !stagger.is_zero() {
                    tokio::time::sleep(stagger).await;
                }
                (index, row, geocoder.geocode(row.address()).await)
            })
            .buffered(self.config.concurrent_requests);

        while let Some((index, row, result)) = outcomes.next().await {
            self.record_outcome(offset + index + 1, total, row, result, summary);
        }

        if offset + batch.len() < total {
            self.pause().await;
        }
    }

    async fn pause(&self) {
        if !self.config.request_delay.is_zero() {
            tokio::time::sleep(self.config.request_delay).await;
        }
    }

    fn record_outcome(
        &self,
        position: usize,
        total: usize,
        row: &Row,
        result: Result<GeocodeOutcome>,
        summary: &mut RunSummary,
    ) {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                // 本次不寫入，下次 -c 會再嘗試
                tracing::error!("❌ Row {} ({}) skipped: {}", position, row.identifier(), e);
                summary.skipped += 1;
                return;
            }
        };

        if let GeocodeOutcome::Unresolved { reason } = &outcome {
            tracing::debug!("Row {} ({}) unresolved: {}", position, row.identifier(), reason);
        }

        let status = outcome.status();
        let output = OutputRow::new(row, outcome.result());
        if let Err(e) = self.writer.append(&output) {
            tracing::error!(
                "❌ Could not append output for {}: {}",
                row.identifier(),
                e.user_friendly_message()
            );
            summary.skipped += 1;
            return;
        }

        let entry = LogEntry {
            position: row.index,
            identifier: row.identifier().to_string(),
            status,
        };
        if let Err(e) = self.log.append(&entry) {
            tracing::error!(
                "❌ Could not append log entry for {}: {}",
                row.identifier(),
                e.user_friendly_message()
            );
        }

        println!("{} / {} : {} :: \"{}\"", position, total, row.identifier(), status);
        summary.record(status);
    }
}
