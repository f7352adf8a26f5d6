//! Common error types for verse

use thiserror::Error;

use crate::validation::ValidationError;

/// Common result type for verse operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the server and the trainer
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON document could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request body
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// A poem with the same normalized title and author already exists
    #[error("Poem already exists: \"{title}\" by {author}")]
    Duplicate { title: String, author: String },

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
