use crate::utils::error::{GeocodeError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// `--config` 指定的 TOML 設定檔，所有區段皆為選填
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub batch: BatchSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilesConfig {
    pub input: Option<String>,
    pub output: Option<String>,
    pub log: Option<String>,
    pub delimiter: Option<char>,
    pub quote: Option<char>,
    pub has_header: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeocoderConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub region: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSection {
    pub size: Option<usize>,
    pub delay_ms: Option<u64>,
    pub concurrent_requests: Option<usize>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${API_KEY})；未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| GeocodeError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 仍含 `${...}` 的金鑰表示環境變數未設定
    pub fn api_key(&self) -> Option<&str> {
        self.geocoder
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty() && !key.contains("${"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = TomlConfig::from_toml_str(
            r#"
[files]
input = "./data/input/in_table.csv"
output = "./data/output/out_table.csv"
log = "./data/logs/download_log.csv"
delimiter = ";"
quote = '"'
has_header = false

[geocoder]
endpoint = "http://localhost:9000/geocode"
api_key = "literal-key"
region = "US"
timeout_seconds = 5

[batch]
size = 10
delay_ms = 0
concurrent_requests = 4
"#,
        )
        .unwrap();

        assert_eq!(config.files.delimiter, Some(';'));
        assert_eq!(config.files.quote, Some('"'));
        assert_eq!(config.files.has_header, Some(false));
        assert_eq!(config.geocoder.region.as_deref(), Some("US"));
        assert_eq!(config.api_key(), Some("literal-key"));
        assert_eq!(config.batch.size, Some(10));
        assert_eq!(config.batch.concurrent_requests, Some(4));
    }

    #[test]
    fn test_sections_are_optional() {
        let config = TomlConfig::from_toml_str("[batch]\nsize = 5\n").unwrap();

        assert_eq!(config.batch.size, Some(5));
        assert!(config.files.input.is_none());
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("GEOCODE_BATCH_TEST_KEY", "from-env");

        let config = TomlConfig::from_toml_str(
            "[geocoder]\napi_key = \"${GEOCODE_BATCH_TEST_KEY}\"\n",
        )
        .unwrap();

        assert_eq!(config.api_key(), Some("from-env"));
    }

    #[test]
    fn test_unresolved_placeholder_is_not_a_key() {
        let config = TomlConfig::from_toml_str(
            "[geocoder]\napi_key = \"${GEOCODE_BATCH_SURELY_UNSET_VAR}\"\n",
        )
        .unwrap();

        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = TomlConfig::from_toml_str("[batch\nsize = ").unwrap_err();
        assert!(matches!(err, GeocodeError::TomlError(_)));
    }
}
