use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{platform} responded with HTTP {status}")]
    UpstreamStatus { platform: String, status: u16 },

    #[error("Failed to parse {platform} response: {message}")]
    FeedParseError { platform: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required query parameter: {name}")]
    MissingParameter { name: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

impl SearchError {
    /// 呼叫端輸入造成的錯誤 (對應 HTTP 4xx)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SearchError::MissingParameter { .. } | SearchError::InvalidRequest { .. }
        )
    }

    /// 外部資料來源造成的錯誤 (對應 HTTP 502)
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            SearchError::ApiError(_)
                | SearchError::UpstreamStatus { .. }
                | SearchError::FeedParseError { .. }
        )
    }

    /// 給終端使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            SearchError::ApiError(e) if e.is_timeout() => {
                "The procurement source did not respond in time".to_string()
            }
            SearchError::ApiError(e) if e.is_connect() => {
                "Could not connect to the procurement source".to_string()
            }
            SearchError::ApiError(_) => "A request to a procurement source failed".to_string(),
            SearchError::UpstreamStatus { platform, status } => {
                format!("{} is currently unavailable (HTTP {})", platform, status)
            }
            SearchError::FeedParseError { platform, .. } => {
                format!("{} returned data that could not be read", platform)
            }
            SearchError::ConfigError { .. }
            | SearchError::ConfigValidationError { .. }
            | SearchError::InvalidConfigValueError { .. } => {
                format!("Configuration problem: {}", self)
            }
            SearchError::MissingParameter { name } => format!("Please provide '{}'", name),
            other => other.to_string(),
        }
    }

    /// 建議的修正方式
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SearchError::ApiError(_) | SearchError::UpstreamStatus { .. } => {
                "Check network connectivity and try again later"
            }
            SearchError::FeedParseError { .. } => {
                "The provider may have changed its response format; check the endpoint setting"
            }
            SearchError::ConfigError { .. }
            | SearchError::ConfigValidationError { .. }
            | SearchError::InvalidConfigValueError { .. } => {
                "Review the TOML configuration file and referenced environment variables"
            }
            SearchError::MissingParameter { .. } | SearchError::InvalidRequest { .. } => {
                "Adjust the request parameters and retry"
            }
            SearchError::IoError(_) => "Check that the output path exists and is writable",
            SearchError::CsvError(_) | SearchError::SerializationError(_) => {
                "Retry the export in another format"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
