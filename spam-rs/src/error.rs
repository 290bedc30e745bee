use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpamError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Rate limit exceeded: {limit} per {window_secs} seconds")]
    RateLimitExceeded {
        limit: u32,
        window_secs: u64,
        retry_after_secs: u64,
    },

    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("Feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpamError {
    /// Errors caused by the caller rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SpamError::InvalidInput(_) | SpamError::RateLimitExceeded { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SpamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(SpamError::InvalidInput("empty".to_string()).is_client_error());
        assert!(SpamError::RateLimitExceeded {
            limit: 50,
            window_secs: 60,
            retry_after_secs: 1,
        }
        .is_client_error());
        assert!(!SpamError::ModelNotLoaded.is_client_error());
        assert!(!SpamError::Internal("boom".to_string()).is_client_error());
        assert!(!SpamError::DimensionMismatch {
            expected: 2,
            actual: 3,
        }
        .is_client_error());
    }
}
