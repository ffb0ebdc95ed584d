use crate::value::BoxError;

/// Error types for sqlx-named
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error compiling the placeholder pattern
    #[error("Failed to parse SQL template: {0}")]
    Parse(#[from] regex::Error),

    /// Error from SQLx database operations, forwarded unchanged
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Arguments of the wrong kind were supplied for a named call
    #[error("Expected {expected} arguments, got {found}")]
    InvalidArgumentKind {
        expected: &'static str,
        found: &'static str,
    },

    /// Placeholder was referenced but the mapping or record has no value for it
    #[error("Placeholder '?{0}' has no binding")]
    MissingBindingKey(String),

    /// A value failed its `ToValue` conversion
    #[error("Failed to convert value bound to '?{name}': {source}")]
    ValueConversion {
        name: String,
        #[source]
        source: BoxError,
    },
}

/// Result type alias for sqlx-named operations
pub type Result<T> = std::result::Result<T, Error>;
