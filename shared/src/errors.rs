//! Shared error types for the report generation pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },

    #[error("Serialization failed: {message}")]
    SerializationError { message: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
