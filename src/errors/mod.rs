//! Error types for the Ollama client.
//!
//! Every failure of an embedding call surfaces as one [`OllamaError`]. Nothing
//! is retried internally; [`OllamaError::is_retryable`] lets callers decide.

use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for Ollama operations.
pub type OllamaResult<T> = Result<T, OllamaError>;

/// Error type for Ollama client operations.
#[derive(Debug, Error)]
pub enum OllamaError {
    /// Invalid construction-time configuration. The adapter must not be used.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// Invalid call argument. No network call was attempted.
    #[error("Invalid argument '{param}': {message}")]
    InvalidArgument {
        /// Error message.
        message: String,
        /// The argument that was rejected.
        param: String,
    },

    /// The caller cancelled the call before the exchange completed.
    #[error("Operation cancelled")]
    Cancelled,

    /// The response body could not be decoded or did not match the request.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Error message.
        message: String,
        /// Underlying parse failure, if any.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The service explicitly reported a failure.
    #[error("Ollama error: {message}")]
    Service {
        /// The message reported by the service, verbatim.
        message: String,
        /// HTTP status code, when the failure came with an unsuccessful status.
        status: Option<u16>,
    },

    /// Unsuccessful HTTP status without a recognizable error body.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The transport could not complete the exchange.
    #[error("Transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },
}

impl OllamaError {
    /// Returns true if repeating the same call could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            OllamaError::Transport { .. } => true,
            OllamaError::Http { status, .. } => matches!(status, 429 | 500..=504),
            OllamaError::Service { status, .. } => {
                matches!(status, Some(429 | 500..=504))
            }
            _ => false,
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        OllamaError::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(param: impl Into<String>, message: impl Into<String>) -> Self {
        OllamaError::InvalidArgument {
            message: message.into(),
            param: param.into(),
        }
    }

    /// Creates a protocol error without an underlying parse failure.
    pub fn protocol(message: impl Into<String>) -> Self {
        OllamaError::Protocol {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a service error reported in a successful response body.
    pub fn service(message: impl Into<String>) -> Self {
        OllamaError::Service {
            message: message.into(),
            status: None,
        }
    }
}

/// Error body returned by Ollama alongside unsuccessful statuses.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// The error message.
    pub error: String,
}

impl From<TransportError> for OllamaError {
    fn from(err: TransportError) -> Self {
        OllamaError::Transport {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for OllamaError {
    fn from(err: serde_json::Error) -> Self {
        OllamaError::Protocol {
            message: format!("Failed to decode response: {}", err),
            source: Some(err),
        }
    }
}

impl From<url::ParseError> for OllamaError {
    fn from(err: url::ParseError) -> Self {
        OllamaError::InvalidConfiguration {
            message: format!("Invalid URL: {}", err),
        }
    }
}
