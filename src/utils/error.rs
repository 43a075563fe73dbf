use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeneGraphError {
    #[error("Invalid input for '{field}': {message}")]
    InvalidInput { field: String, message: String },

    #[error("Ephemeris error: {message}")]
    EphemerisError { message: String },

    #[error("Location error: {message}")]
    LocationError { message: String },

    #[error("Classification invariant violated: {message}")]
    ClassificationInvariantViolation { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

/// 錯誤分類，對外以 kind + message 的結構回報
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidInput,
    EphemerisError,
    LocationError,
    ClassificationInvariantViolation,
    ConfigError,
    IoError,
    SerializationError,
}

/// 結構化錯誤回報
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl GeneGraphError {
    pub fn invalid_input(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn ephemeris(message: impl Into<String>) -> Self {
        Self::EphemerisError {
            message: message.into(),
        }
    }

    pub fn location(message: impl Into<String>) -> Self {
        Self::LocationError {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::EphemerisError { .. } => ErrorKind::EphemerisError,
            Self::LocationError { .. } => ErrorKind::LocationError,
            Self::ClassificationInvariantViolation { .. } => {
                ErrorKind::ClassificationInvariantViolation
            }
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorKind::ConfigError
            }
            Self::IoError(_) => ErrorKind::IoError,
            Self::SerializationError(_) | Self::CsvError(_) => ErrorKind::SerializationError,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidInput { field, message } => {
                format!("輸入資料有誤 ({}): {}", field, message)
            }
            Self::EphemerisError { message } => format!("星曆計算失敗: {}", message),
            Self::LocationError { message } => format!("無法解析出生地點或時區: {}", message),
            Self::ClassificationInvariantViolation { .. } => {
                "閘門表資料損毀，無法分類經度".to_string()
            }
            Self::ConfigError { message } => format!("設定錯誤: {}", message),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("設定值無效 ({}): {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.kind() {
            ErrorKind::InvalidInput => "Check birth date (YYYY-MM-DD) and time (HH:MM) formats",
            ErrorKind::EphemerisError => {
                "Use a date inside the ephemeris range or switch the ephemeris backend"
            }
            ErrorKind::LocationError => {
                "Pass --lat, --lon and --timezone explicitly to skip geocoding"
            }
            ErrorKind::ClassificationInvariantViolation => "Rebuild the gate table; this is a bug",
            ErrorKind::ConfigError => "Review the TOML configuration file and CLI overrides",
            ErrorKind::IoError => "Check that the output path exists and is writable",
            ErrorKind::SerializationError => "Report the issue together with the input data",
        }
    }

    /// 依錯誤分類決定 CLI 的結束碼
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::InvalidInput | ErrorKind::ConfigError => 2,
            ErrorKind::LocationError => 3,
            ErrorKind::EphemerisError => 4,
            ErrorKind::ClassificationInvariantViolation => 70,
            ErrorKind::IoError | ErrorKind::SerializationError => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, GeneGraphError>;
