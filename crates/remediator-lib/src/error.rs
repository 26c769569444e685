//! Error types for the remediation controller

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemediationError {
    /// A cluster API call failed or timed out
    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    /// Invalid or missing configuration; fatal at startup
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// An alert could not be delivered; never leaves the alert dispatcher
    #[error("alert delivery failed: {0}")]
    AlertDelivery(String),
}

impl RemediationError {
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        RemediationError::Transport {
            operation,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RemediationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display() {
        let err = RemediationError::transport("delete pod", "connection refused");
        assert_eq!(err.to_string(), "delete pod failed: connection refused");
    }
}
