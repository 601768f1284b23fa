use thiserror::Error;

/// Message shown when a catalog request fails
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Failed to fetch recipes. Please try again later.";

/// Everything that can go wrong in Culinary Compass
#[derive(Error, Debug)]
pub enum Error {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Cache operation failed: {0}")]
    CacheError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Recipe not found: {0}")]
    NotFound(String),

    #[error("Please enter a search term or select a filter.")]
    EmptyQuery,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Text suitable for a status line. Upstream details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Error::ApiError(_) => UPSTREAM_FAILURE_MESSAGE.to_string(),
            Error::NotFound(_) => "Recipe not found.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Favorites conditions the store recovers from on its own.
///
/// The store has already logged these and carried on; callers get them
/// back so they can decide whether anyone else needs to hear about it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreWarning {
    #[error("Persisted favorites could not be parsed: {0}")]
    CorruptState(String),

    #[error("Failed to read persisted favorites: {0}")]
    ReadFailed(String),

    #[error("Failed to save favorites: {0}")]
    WriteFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_hide_upstream_detail() {
        let err = Error::ApiError("Network error: connection refused".to_string());
        assert_eq!(err.user_message(), UPSTREAM_FAILURE_MESSAGE);

        assert_eq!(
            Error::EmptyQuery.user_message(),
            "Please enter a search term or select a filter."
        );
        assert_eq!(
            Error::NotFound("99999".to_string()).user_message(),
            "Recipe not found."
        );
    }
}
