use thiserror::Error;

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Canonical error surface shared by stores and the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("{entity} not found")]
    NotFound { entity: String },
    #[error("record has no persistent reference")]
    MissingReference,
}

impl Error {
    /// Wrap an underlying I/O or serialisation failure.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Error::Storage(err.to_string())
    }
}
