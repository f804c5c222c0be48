//! Error types for culler.

use thiserror::Error;

/// A shared error type for the entire culler workspace.
///
/// `PermissionDenied`, `StoreUnavailable` and `Persistence` are the failures a
/// review session distinguishes; the rest come from the adapters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CullerError {
    /// The photo store refused access. Terminal until access is granted again.
    #[error("Permission denied by item store")]
    PermissionDenied,

    /// The photo store could not serve the request. Safe to retry.
    #[error("Item store unavailable: {0}")]
    StoreUnavailable(String),

    /// A key-value write or read failed.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CullerError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a StoreUnavailable error
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable(message.into())
    }

    /// Creates a Persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }

    /// Check if a retry of the same call may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Io { .. })
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for CullerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for CullerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for CullerError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for CullerError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, CullerError>`.
pub type Result<T> = std::result::Result<T, CullerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_keeps_kind() {
        let err: CullerError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope").into();
        match err {
            CullerError::Io { message } => assert!(message.contains("PermissionDenied")),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(CullerError::store_unavailable("offline").is_recoverable());
        assert!(!CullerError::PermissionDenied.is_recoverable());
        assert!(!CullerError::persistence("disk full").is_recoverable());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: CullerError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(err.is_serialization());
    }
}
