//! Shared error types for the backend contract

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Deserialization failed: {message}")]
    DeserializationError { message: String },

    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },

    #[error("Storyboard cell {index} out of range (table has {len} cells)")]
    CellOutOfRange { index: usize, len: usize },
}

impl SharedError {
    pub fn invalid_config(field: &str, value: impl ToString) -> Self {
        SharedError::InvalidConfig {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

pub type SharedResult<T> = Result<T, SharedError>;
