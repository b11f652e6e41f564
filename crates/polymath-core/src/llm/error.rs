//! LLM error types

use std::fmt;

/// Error type for LLM operations
#[derive(Debug, Clone)]
pub enum LlmError {
    /// Network/connection error
    Connection(String),

    /// API error (authentication, server error, etc.)
    Api { status: u16, message: String },

    /// Provider not available
    ProviderUnavailable(String),

    /// Request timeout
    Timeout,

    /// Response body did not have the expected shape
    InvalidResponse(String),

    /// Rate limited
    RateLimited { retry_after: Option<u64> },

    /// Internal error
    Internal(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::Connection(msg) => write!(f, "Connection error: {}", msg),
            LlmError::Api { status, message } => {
                write!(f, "API error ({}): {}", status, message)
            }
            LlmError::ProviderUnavailable(provider) => {
                write!(f, "Provider unavailable: {}", provider)
            }
            LlmError::Timeout => write!(f, "Request timed out"),
            LlmError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            LlmError::RateLimited { retry_after } => {
                if let Some(seconds) = retry_after {
                    write!(f, "Rate limited, retry after {} seconds", seconds)
                } else {
                    write!(f, "Rate limited")
                }
            }
            LlmError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for LlmError {}

impl From<ureq::Error> for LlmError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => {
                let retry_after = response
                    .header("retry-after")
                    .and_then(|v| v.parse::<u64>().ok());
                let message = response
                    .into_string()
                    .unwrap_or_else(|_| "Unknown error".to_string());
                if status == 429 {
                    LlmError::RateLimited { retry_after }
                } else if status == 401 || status == 403 {
                    LlmError::Api {
                        status,
                        message: "Authentication failed".to_string(),
                    }
                } else {
                    LlmError::Api { status, message }
                }
            }
            ureq::Error::Transport(transport) => {
                let message = transport.to_string();
                if message.contains("timed out") {
                    LlmError::Timeout
                } else {
                    LlmError::Connection(message)
                }
            }
        }
    }
}

impl From<std::io::Error> for LlmError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::TimedOut {
            LlmError::Timeout
        } else {
            LlmError::Internal(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::InvalidResponse(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(LlmError::Timeout.to_string(), "Request timed out");
        assert_eq!(
            LlmError::RateLimited { retry_after: Some(3) }.to_string(),
            "Rate limited, retry after 3 seconds"
        );
        assert_eq!(
            LlmError::Api {
                status: 500,
                message: "boom".into()
            }
            .to_string(),
            "API error (500): boom"
        );
    }

    #[test]
    fn test_io_timeout_maps_to_timeout() {
        let err: LlmError = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow").into();
        assert!(matches!(err, LlmError::Timeout));
    }
}
