pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliConfig;

pub use crate::adapters::geocode::GeocodeClient;
pub use crate::config::BatchConfig;
pub use crate::core::{
    controller::BatchController, progress_log::ProgressLog, result_writer::ResultWriter,
    table::{TableFormat, TableReader},
};
pub use crate::domain::model::{GeocodeOutcome, GeocodeResult, RunMode, RunSummary};
pub use crate::domain::ports::Geocoder;
pub use crate::utils::error::{GeocodeError, Result};
