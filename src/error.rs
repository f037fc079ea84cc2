//! Error types for fetch orchestration.

use std::fmt;

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for fetch orchestration.
///
/// Only [`Error::SerializationError`] is ever returned from `run()`;
/// fetch and transform failures are captured into the published
/// [`FetchState`](crate::state::FetchState) instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A fetch key could not be canonicalized.
    ///
    /// Common causes:
    /// - A key part's `Serialize` impl returned an error
    /// - A map inside the key has non-string keys
    SerializationError(String),

    /// The fetch source failed.
    ///
    /// Captured into `FetchState::error`; previous `data` is kept.
    FetchFailure(String),

    /// The transform applied to a raw response failed.
    ///
    /// Captured the same way as [`Error::FetchFailure`].
    TransformFailure(String),

    /// Generic error with custom message.
    Other(String),
}

impl Error {
    /// Build a fetch failure from any displayable source error.
    pub fn fetch_failure(e: impl fmt::Display) -> Self {
        Error::FetchFailure(e.to_string())
    }

    /// Build a transform failure from any displayable error.
    pub fn transform_failure(e: impl fmt::Display) -> Self {
        Error::TransformFailure(e.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::FetchFailure(msg) => write!(f, "Fetch failed: {}", msg),
            Error::TransformFailure(msg) => write!(f, "Transform failed: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}
