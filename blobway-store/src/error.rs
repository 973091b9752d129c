use thiserror::Error;

/// Result type for blob operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors that can occur during blob operations
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Blob not found: {id}")]
    NotFound { id: String },

    #[error("Invalid request: {message}")]
    Invalid { message: String },

    #[error("Invalid namespace segment {name:?}: {reason}")]
    InvalidNamespace { name: String, reason: &'static str },

    #[error("Namespace depth {depth} exceeds maximum {max}")]
    NamespaceTooDeep { depth: usize, max: usize },

    #[error("Blob size {size} exceeds maximum {max}")]
    PayloadTooLarge { size: u64, max: u64 },

    #[error("Storage backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl BlobError {
    /// Create a backend error from any error type
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    /// Create an invalid request error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// True for failures caused by the caller's address rather than the store:
    /// a missing object or a path that cannot name one.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Invalid { .. }
                | Self::InvalidNamespace { .. }
                | Self::NamespaceTooDeep { .. }
        )
    }
}
