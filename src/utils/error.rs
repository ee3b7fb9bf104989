use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Unexpected geocoding response: {message}")]
    UnexpectedResponse { message: String },
}

impl GeocodeError {
    /// 給終端使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            GeocodeError::ApiError(_) => "Could not reach the geocoding service".to_string(),
            GeocodeError::CsvError(e) => format!("Could not write a delimited line: {}", e),
            GeocodeError::IoError(e) => format!("File system error: {}", e),
            GeocodeError::SerializationError(_) | GeocodeError::UnexpectedResponse { .. } => {
                "The geocoding service returned a payload that could not be read".to_string()
            }
            GeocodeError::TomlError(_) => "The configuration file is not valid TOML".to_string(),
            GeocodeError::ConfigError { message } => message.clone(),
            GeocodeError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            GeocodeError::MissingConfigError { field } => {
                format!("Missing required setting '{}'", field)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            GeocodeError::ApiError(_) => "Check the network connection and the API endpoint",
            GeocodeError::CsvError(_) | GeocodeError::IoError(_) => {
                "Check that the data directories exist and are writable"
            }
            GeocodeError::SerializationError(_) | GeocodeError::UnexpectedResponse { .. } => {
                "Run again with -c to retry the skipped rows"
            }
            GeocodeError::TomlError(_) | GeocodeError::ConfigError { .. } => {
                "Fix the configuration file passed with --config"
            }
            GeocodeError::InvalidConfigValueError { .. } => {
                "Correct the value on the command line or in the configuration file"
            }
            GeocodeError::MissingConfigError { .. } => {
                "Set API_KEY in the environment or in a .env file"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, GeocodeError>;
