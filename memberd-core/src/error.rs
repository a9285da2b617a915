/// Structured error types for memberd library crates.
///
/// Uses `thiserror` for better API surface and error composition.
/// The binary crate (memberd-cli) can still use `anyhow` for convenience,
/// but library consumers get structured, composable errors.
use thiserror::Error;

/// Main error type for memberd operations
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A membership or role date failed RFC 3339 parsing
    #[error("invalid {field} '{value}': {source}")]
    InvalidDate {
        field: &'static str,
        value: String,
        source: chrono::ParseError,
    },

    /// Payload arrived without the required uuid
    #[error("membership payload has no uuid")]
    MissingUuid,

    /// Request body could not be deserialized
    #[error("invalid payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The graph backend failed or rejected a statement batch
    #[error("graph backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    /// More statements than the runner may submit in one batch
    #[error("batch of {got} statements exceeds the limit of {limit}")]
    BatchTooLarge { got: usize, limit: usize },
}

/// Result type alias for memberd operations
pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    /// Create an invalid date error
    pub fn invalid_date(
        field: &'static str,
        value: impl Into<String>,
        source: chrono::ParseError,
    ) -> Self {
        Self::InvalidDate {
            field,
            value: value.into(),
            source,
        }
    }

    /// Wrap a storage-engine error
    pub fn backend(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let source = chrono::DateTime::parse_from_rfc3339("not-a-date").unwrap_err();
        let err = ServiceError::invalid_date("inceptionDate", "not-a-date", source);
        assert!(err.to_string().contains("invalid inceptionDate"));
        assert!(err.to_string().contains("not-a-date"));

        let err = ServiceError::BatchTooLarge { got: 2000, limit: 1024 };
        assert_eq!(
            err.to_string(),
            "batch of 2000 statements exceeds the limit of 1024"
        );
    }

    #[test]
    fn test_decode_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ServiceError = json_err.into();
        assert!(matches!(err, ServiceError::Decode(_)));
    }
}
