//! Common error types for OpenHub.

use thiserror::Error;

use crate::types::BindingKind;

/// Top-level error type for OpenHub operations.
///
/// Only the `Display` form of an error crosses the proxy wire, so the
/// messages here are part of the observable protocol.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested binding is absent from the current bindings.
    #[error("Binding '{0}' not found or not supported by this provider")]
    BindingNotFound(BindingKind),

    /// The binding exists but has no operation with this name.
    #[error("Method '{method}' not found on binding '{binding}'")]
    MethodNotFound { binding: BindingKind, method: String },

    /// An optional operation the underlying binding does not expose.
    #[error("{0} is not available")]
    NotAvailable(String),

    /// A provider was handed a context tagged for another platform.
    #[error("{provider} provider cannot extract bindings from platform: {platform}")]
    PlatformMismatch { provider: String, platform: String },

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Binary-to-text encoding failed.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Storage operation failed inside an underlying binding.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Network operation failed.
    #[error("Network error: {0}")]
    Network(String),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A remote proxy handler reported a failure.
    #[error("{0}")]
    Remote(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_not_found_message() {
        let err = Error::MethodNotFound {
            binding: BindingKind::Kv,
            method: "doesNotExist".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Method 'doesNotExist' not found on binding 'kv'"
        );
    }

    #[test]
    fn test_remote_message_is_verbatim() {
        let err = Error::Remote("no such table: users".to_string());
        assert_eq!(err.to_string(), "no such table: users");
    }

    #[test]
    fn test_platform_mismatch_message() {
        let err = Error::PlatformMismatch {
            provider: "cloudflare".to_string(),
            platform: "aws".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cloudflare provider cannot extract bindings from platform: aws"
        );
    }
}
