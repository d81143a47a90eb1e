//! Error types for the product catalog

use thiserror::Error;

/// Result type alias using the catalog Error
pub type Result<T> = std::result::Result<T, Error>;

/// Catalog error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A request payload could not be turned into a product. The message is
    /// returned to clients verbatim.
    #[error("{0}")]
    DataValidation(String),

    #[error("Product with id {id} was not found")]
    NotFound { id: i64 },

    #[error("Unsupported database URI '{0}': only sqlite URIs and paths are supported")]
    UnsupportedDatabase(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::DataValidation(msg.into())
    }
}
