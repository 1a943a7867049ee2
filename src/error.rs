use serde::ser::Serializer;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] simd_json::Error),
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Failure modes of a single upstream request and of the retry loop around it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("upstream rate limit exceeded (HTTP 429)")]
    RateLimited,
    #[error("upstream returned HTTP {status}")]
    Status { status: u16 },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("all {attempts} attempts failed, last error: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<FetchError>,
    },
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout { .. } | Self::RateLimited | Self::Status { .. }
        )
    }

    /// The underlying cause for an exhausted retry loop, otherwise the error itself.
    pub fn root_cause(&self) -> &FetchError {
        match self {
            Self::Exhausted { last, .. } => last.root_cause(),
            other => other,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            return Self::Timeout { timeout_ms: 0 };
        }
        Self::Transport(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_retryable_errors() {
        assert!(FetchError::Transport("dns".to_string()).is_retryable());
        assert!(FetchError::Timeout { timeout_ms: 10 }.is_retryable());
        assert!(FetchError::RateLimited.is_retryable());
        assert!(FetchError::Status { status: 503 }.is_retryable());
        assert!(!FetchError::Malformed("bad".to_string()).is_retryable());
        assert!(!FetchError::Exhausted {
            attempts: 3,
            last: Box::new(FetchError::RateLimited),
        }
        .is_retryable());
    }

    #[test]
    fn root_cause_unwraps_exhausted() {
        let error = FetchError::Exhausted {
            attempts: 3,
            last: Box::new(FetchError::Timeout { timeout_ms: 10_000 }),
        };
        assert_eq!(
            error.root_cause(),
            &FetchError::Timeout { timeout_ms: 10_000 }
        );
    }

    #[test]
    fn app_error_serializes_as_display_string() {
        let error = AppError::InvalidArgument("priceMin must not exceed priceMax".to_string());
        let encoded = simd_json::serde::to_string(&error).expect("error should serialize");
        assert_eq!(
            encoded,
            "\"invalid argument: priceMin must not exceed priceMax\""
        );
    }
}
