use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    PatternError(#[from] regex::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration field '{field}' is invalid: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Page {url} did not show [{markers}] within {waited:?}")]
    PageTimeout {
        url: String,
        markers: String,
        waited: Duration,
    },

    #[error("Invalid selector '{selector}': {message}")]
    SelectorError { selector: String, message: String },

    #[error("Cannot parse '{text}' as a number")]
    NumberParseError { text: String },

    #[error("Column '{column}' not found in {table}")]
    MissingColumn { column: String, table: String },

    #[error("Model feature '{feature}' is not present in the encoded candidates")]
    MissingFeature { feature: String },

    #[error("Model features {actual:?} do not match the expected {expected:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Shape mismatch: {message}")]
    ShapeMismatch { message: String },

    #[error("Invalid value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Model error: {message}")]
    ModelError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::HttpError(_) | AppError::PageTimeout { .. } => ErrorCategory::Network,
            AppError::ConfigError { .. }
            | AppError::ConfigValidationError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::PatternError(_)
            | AppError::SelectorError { .. } => ErrorCategory::Configuration,
            AppError::IoError(_) => ErrorCategory::System,
            AppError::CsvError(_)
            | AppError::SerializationError(_)
            | AppError::NumberParseError { .. }
            | AppError::MissingColumn { .. }
            | AppError::MissingFeature { .. }
            | AppError::FeatureMismatch { .. }
            | AppError::ShapeMismatch { .. }
            | AppError::InvalidValue { .. }
            | AppError::ModelError { .. } => ErrorCategory::Data,
        }
    }

    /// Maps to the process exit code: Low 0, Medium 2, High 1, Critical 3.
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AppError::HttpError(_) => "Check network connectivity and the scraper base_url",
            AppError::PageTimeout { .. } => {
                "The site may be slow or its layout changed; raise scraper.page_wait_seconds or check the marker headings"
            }
            AppError::SelectorError { .. } | AppError::PatternError(_) => {
                "Fix the selector or inventory_pattern in the configuration file"
            }
            AppError::ConfigError { .. }
            | AppError::ConfigValidationError { .. }
            | AppError::InvalidConfigValueError { .. } => "Review the TOML configuration and CLI flags",
            AppError::IoError(_) => "Check that the input files exist and the output directory is writable",
            AppError::CsvError(_) | AppError::InvalidValue { .. } | AppError::NumberParseError { .. } => {
                "Inspect the input data for malformed cells"
            }
            AppError::MissingColumn { .. } => "Check filler.categorical_columns against the candidate CSV header",
            AppError::MissingFeature { .. } => {
                "A category seen at training time is absent from this batch; enable filler.absent_indicators_as_zero if an all-zero indicator is correct"
            }
            AppError::FeatureMismatch { .. } | AppError::ModelError { .. } | AppError::SerializationError(_) => {
                "Re-export the model artifact or update filler.expected_features"
            }
            AppError::ShapeMismatch { .. } => "The candidate and master CSV files must have the same rows in the same order",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not load the trading-post pages: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Input data problem: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
