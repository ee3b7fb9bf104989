#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::table::TableFormat;
use crate::utils::error::{GeocodeError, Result};
use crate::utils::validation::{self, Validate};
use std::path::PathBuf;
use std::time::Duration;
use toml_config::TomlConfig;

pub const DEFAULT_INPUT_PATH: &str = "./data/input/in_table.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "./data/output/out_table.csv";
pub const DEFAULT_LOG_PATH: &str = "./data/logs/download_log.csv";
pub const DEFAULT_API_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode";
pub const DEFAULT_REGION: &str = "CA";
pub const DEFAULT_BATCH_SIZE: usize = 30;
pub const DEFAULT_DELAY_MS: u64 = 100;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const API_KEY_ENV: &str = "API_KEY";

/// 啟動時建立一次、傳給 `BatchController` 的完整設定
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub log_path: PathBuf,
    pub delimiter: char,
    pub quote: Option<char>,
    pub has_header: bool,
    pub api_endpoint: String,
    pub api_key: String,
    pub region: String,
    pub request_timeout: Duration,
    pub batch_size: usize,
    pub request_delay: Duration,
    /// 1 表示逐列處理；大於 1 時同一批次內以有限並行發出請求
    pub concurrent_requests: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            delimiter: ';',
            quote: None,
            has_header: true,
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            api_key: String::new(),
            region: DEFAULT_REGION.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            batch_size: DEFAULT_BATCH_SIZE,
            request_delay: Duration::from_millis(DEFAULT_DELAY_MS),
            concurrent_requests: 1,
        }
    }
}

impl BatchConfig {
    /// 套用 TOML 設定檔中有指定的欄位
    pub fn apply_toml(&mut self, toml: &TomlConfig) {
        let files = &toml.files;
        if let Some(input) = &files.input {
            self.input_path = PathBuf::from(input);
        }
        if let Some(output) = &files.output {
            self.output_path = PathBuf::from(output);
        }
        if let Some(log) = &files.log {
            self.log_path = PathBuf::from(log);
        }
        if let Some(delimiter) = files.delimiter {
            self.delimiter = delimiter;
        }
        if files.quote.is_some() {
            self.quote = files.quote;
        }
        if let Some(has_header) = files.has_header {
            self.has_header = has_header;
        }

        let geocoder = &toml.geocoder;
        if let Some(endpoint) = &geocoder.endpoint {
            self.api_endpoint = endpoint.clone();
        }
        if let Some(key) = toml.api_key() {
            self.api_key = key.to_string();
        }
        if let Some(region) = &geocoder.region {
            self.region = region.clone();
        }
        if let Some(timeout) = geocoder.timeout_seconds {
            self.request_timeout = Duration::from_secs(timeout);
        }

        let batch = &toml.batch;
        if let Some(size) = batch.size {
            self.batch_size = size;
        }
        if let Some(delay) = batch.delay_ms {
            self.request_delay = Duration::from_millis(delay);
        }
        if let Some(concurrent) = batch.concurrent_requests {
            self.concurrent_requests = concurrent;
        }
    }

    /// 尚未設定金鑰時從環境變數取得
    pub fn apply_env(&mut self) {
        if self.api_key.trim().is_empty() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                self.api_key = key;
            }
        }
    }

    pub fn table_format(&self) -> TableFormat {
        TableFormat {
            delimiter: self.delimiter,
            quote: self.quote,
        }
    }
}

impl Validate for BatchConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("geocoder.endpoint", &self.api_endpoint)?;
        validation::validate_path("files.input", &self.input_path)?;
        validation::validate_path("files.output", &self.output_path)?;
        validation::validate_path("files.log", &self.log_path)?;
        validation::validate_non_empty_string("geocoder.region", &self.region)?;
        validation::validate_positive_number("batch.size", self.batch_size, 1)?;
        validation::validate_positive_number(
            "batch.concurrent_requests",
            self.concurrent_requests,
            1,
        )?;

        let api_key = (!self.api_key.trim().is_empty()).then_some(&self.api_key);
        validation::validate_required_field(API_KEY_ENV, &api_key)?;

        if !self.delimiter.is_ascii() {
            return Err(GeocodeError::InvalidConfigValueError {
                field: "files.delimiter".to_string(),
                value: self.delimiter.to_string(),
                reason: "Delimiter must be a single ASCII character".to_string(),
            });
        }
        if self.quote == Some(self.delimiter) {
            return Err(GeocodeError::InvalidConfigValueError {
                field: "files.quote".to_string(),
                value: self.delimiter.to_string(),
                reason: "Quote character must differ from the delimiter".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> BatchConfig {
        BatchConfig {
            api_key: "test-key".to_string(),
            ..BatchConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = BatchConfig::default();

        assert_eq!(config.batch_size, 30);
        assert_eq!(config.delimiter, ';');
        assert_eq!(config.region, "CA");
        assert!(config.has_header);
        assert_eq!(config.concurrent_requests, 1);
    }

    #[test]
    fn test_validate_accepts_defaults_with_key() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_api_key() {
        let config = BatchConfig::default();
        assert!(matches!(
            config.validate(),
            Err(GeocodeError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let config = BatchConfig {
            batch_size: 0,
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_quote_equal_to_delimiter() {
        let config = BatchConfig {
            quote: Some(';'),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_toml_overrides_only_given_fields() {
        let toml = TomlConfig::from_toml_str(
            r#"
[files]
input = "in.csv"

[geocoder]
api_key = "file-key"

[batch]
delay_ms = 0
"#,
        )
        .unwrap();

        let mut config = BatchConfig::default();
        config.apply_toml(&toml);

        assert_eq!(config.input_path, PathBuf::from("in.csv"));
        assert_eq!(config.output_path, PathBuf::from(DEFAULT_OUTPUT_PATH));
        assert_eq!(config.api_key, "file-key");
        assert_eq!(config.request_delay, Duration::ZERO);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }
}
