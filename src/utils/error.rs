use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("CSV is missing required columns: {columns}")]
    MissingColumnsError { columns: String },

    #[error("Unknown card id: {id}")]
    UnknownCardError { id: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

pub type Result<T> = std::result::Result<T, CollectorError>;
