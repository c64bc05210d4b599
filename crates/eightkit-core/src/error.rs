//! Error types for the 8kit nodes

use thiserror::Error;

use crate::types::ResourceKind;

/// Main error type for 8kit operations
///
/// The variants mirror how a failure should be treated by callers:
/// validation problems are fatal, a missing resource can be recovered through
/// auto-create, and transport failures are retried inside the client.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{kind} \"{name}\" not found. Enable \"Auto Create Set/Lookup\" to create it automatically.")]
    ResourceNotFound { kind: ResourceKind, name: String },

    #[error("API Error ({status}): {message} - Code: {code}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Failed to {action}: {message}")]
    Rejected {
        action: String,
        code: Option<String>,
        message: String,
    },

    #[error("{0} response missing data field")]
    MissingData(String),

    #[error("Request timeout - the server took too long to respond")]
    Timeout,

    #[error("{0}")]
    HostUnreachable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a resource-not-found error
    pub fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        Error::ResourceNotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create an error for a `success: false` payload
    pub fn rejected(action: impl Into<String>, code: Option<String>, message: Option<String>) -> Self {
        Error::Rejected {
            action: action.into(),
            code,
            message: message.unwrap_or_else(|| "Unknown error".to_string()),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Whether the client should try the request again.
    ///
    /// Transport failures, rate limiting (429) and server errors (>= 500)
    /// are retryable; every other 4xx is surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout | Error::HostUnreachable(_) | Error::Network(_) => true,
            Error::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether this error means "the set/lookup does not exist".
    pub fn is_not_found(&self, kind: ResourceKind) -> bool {
        match self {
            Error::ResourceNotFound { kind: k, .. } => *k == kind,
            Error::Api { status, code, .. } => *status == 404 || code == kind.not_found_code(),
            Error::Rejected { code: Some(code), .. } => code == kind.not_found_code(),
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
