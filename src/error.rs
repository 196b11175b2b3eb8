use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Error type for store operations. Every variant is recoverable at the
/// point of the user action: the operation aborts and prior state is kept.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("not a toggleable resource: {0}")]
    InvalidTarget(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl AppError {
    pub fn missing_field(field: &str) -> Self {
        AppError::Validation(format!("missing required field: {}", field))
    }
}
