use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Contract not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: contract is {current}, operation requires {required}")]
    InvalidTransition { current: String, required: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Persistence(err.to_string())
    }
}
