//! LLM-specific error types
//!
//! Typed errors for model operations. Callers in the synthesizer layer never
//! propagate these; they are contained and mapped to fallback values.

/// LLM operation error
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Authentication failed (invalid or expired API key)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limited by the provider
    #[error("Rate limited: {message}")]
    RateLimited {
        /// Seconds to wait before retrying (if provided)
        retry_after: Option<u64>,
        message: String,
    },

    /// Request was invalid (bad parameters, too many tokens, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Network/connection error
    #[error("Network error: {0}")]
    Network(String),

    /// Request timed out
    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Service temporarily unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Provider returned an unexpected response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No credential was supplied for a call that requires one
    #[error("Missing API credential")]
    MissingCredential,
}

impl LlmError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited { .. }
                | LlmError::Network(_)
                | LlmError::Timeout { .. }
                | LlmError::ServiceUnavailable(_)
        )
    }

    /// Get retry-after duration if available
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        match self {
            LlmError::RateLimited { retry_after, .. } => {
                retry_after.map(std::time::Duration::from_secs)
            }
            _ => None,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited {
            retry_after: None,
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout { seconds: 0 }
        } else if err.is_connect() {
            LlmError::Network(format!("Connection failed: {}", err))
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::InvalidResponse(format!("JSON parse error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(LlmError::network("connection reset").is_retryable());
        assert!(LlmError::Timeout { seconds: 30 }.is_retryable());
        assert!(LlmError::rate_limited("quota exceeded").is_retryable());

        assert!(!LlmError::auth("bad key").is_retryable());
        assert!(!LlmError::MissingCredential.is_retryable());
    }

    #[test]
    fn test_retry_after() {
        let err = LlmError::RateLimited {
            retry_after: Some(60),
            message: "quota".to_string(),
        };
        assert_eq!(err.retry_after(), Some(std::time::Duration::from_secs(60)));
        assert_eq!(LlmError::network("failed").retry_after(), None);
    }
}
