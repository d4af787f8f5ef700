use storage::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImporterError>;

#[derive(Error, Debug)]
pub enum ImporterError {
    #[error("Unauthorized: caller is not a global admin")]
    Unauthorized,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict detection failed: {0}")]
    DetectionFailed(#[source] StorageError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Failed to read input: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),
}
