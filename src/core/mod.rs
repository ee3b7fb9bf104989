pub mod append_file;
pub mod controller;
pub mod progress_log;
pub mod result_writer;
pub mod table;

pub use crate::domain::model::{LogEntry, LogStatus, OutputRow, Row, RunMode, RunSummary};
pub use crate::domain::ports::Geocoder;
pub use crate::utils::error::Result;
