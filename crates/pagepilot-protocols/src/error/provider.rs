//! Generation provider errors.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Rate limited: retry after {retry_after_seconds} seconds")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),
}

impl ProviderError {
    /// Classify a non-success HTTP response.
    pub fn from_api_response(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => Self::RateLimited {
                retry_after_seconds: 0,
            },
            401 | 403 => Self::AuthenticationFailed(message),
            400 | 422 => Self::InvalidRequest(message),
            _ => Self::ApiError { status, message },
        }
    }

    /// Attach the server's `retry-after` value to a rate-limit error.
    ///
    /// Other variants pass through unchanged.
    pub fn with_retry_after(self, retry_after: Option<&str>) -> Self {
        match self {
            Self::RateLimited { .. } => Self::RateLimited {
                retry_after_seconds: retry_after.and_then(parse_retry_after).unwrap_or(0),
            },
            other => other,
        }
    }

    /// Whether this error reports an exhausted request budget.
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::ApiError { status: 429, .. }
        )
    }
}

/// Parse a `retry-after` header given in whole seconds. HTTP-date values
/// are not supported and yield `None`.
pub fn parse_retry_after(value: &str) -> Option<u64> {
    value.trim().parse().ok()
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
