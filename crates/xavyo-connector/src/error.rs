//! Connector Framework error types
//!
//! Error definitions with transient/permanent classification for retry logic.
//! Unsupported filter predicates are not errors: the translator degrades them
//! to "fetch everything" and relies on in-memory filtering.

use thiserror::Error;

/// Error that can occur while building records and filters, translating
/// filters, or running connector operations.
#[derive(Debug, Error)]
pub enum ConnectorError {
    // Connection errors (usually transient)
    /// Failed to establish connection to target system.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Connection timed out.
    #[error("connection timeout after {timeout_secs} seconds")]
    ConnectionTimeout { timeout_secs: u64 },

    /// Target system is temporarily unavailable.
    #[error("target system unavailable: {message}")]
    TargetUnavailable { message: String },

    // Construction errors (permanent, caller errors)
    /// A value outside the supported attribute value types.
    #[error("invalid attribute value: {message}")]
    InvalidAttributeValue { message: String },

    /// Attribute name or values violate the attribute rules.
    #[error("invalid attribute '{name}': {message}")]
    InvalidAttribute { name: String, message: String },

    /// Filter was constructed with the wrong arity or value type.
    #[error("invalid filter: {message}")]
    InvalidFilter { message: String },

    /// Record is missing required attributes or is otherwise malformed.
    #[error("invalid object: {message}")]
    InvalidObject { message: String },

    /// Configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    // Evaluation errors
    /// Record data is incompatible with the filter being evaluated.
    #[error("invalid data: {message}")]
    InvalidData { message: String },

    /// A translator hook answered differently between the simulation and
    /// translation passes.
    #[error("filter translator contract violated: {message}")]
    TranslatorContract { message: String },

    // Operation errors
    /// Connector does not implement the requested operation.
    #[error("unsupported operation: {operation}")]
    UnsupportedOperation { operation: String },

    /// Object not found in target system (update/delete target missing).
    #[error("object not found: {identifier}")]
    ObjectNotFound { identifier: String },

    /// Object already exists in target system (create conflict).
    #[error("object already exists: {identifier}")]
    ObjectAlreadyExists { identifier: String },

    /// Operation failed.
    #[error("operation failed: {message}")]
    OperationFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Encryption errors
    /// Guarded value encryption failed.
    #[error("encryption failed: {message}")]
    EncryptionFailed { message: String },

    /// Guarded value decryption failed.
    #[error("decryption failed: {message}")]
    DecryptionFailed { message: String },

    // Internal errors
    /// Internal error.
    #[error("internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ConnectorError {
    /// Check if this error is transient and the operation should be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ConnectorError::ConnectionFailed { .. }
                | ConnectorError::ConnectionTimeout { .. }
                | ConnectorError::TargetUnavailable { .. }
        )
    }

    /// Check if this error is permanent and retry won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConnectorError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            ConnectorError::ConnectionTimeout { .. } => "CONNECTION_TIMEOUT",
            ConnectorError::TargetUnavailable { .. } => "TARGET_UNAVAILABLE",
            ConnectorError::InvalidAttributeValue { .. } => "INVALID_ATTRIBUTE_VALUE",
            ConnectorError::InvalidAttribute { .. } => "INVALID_ATTRIBUTE",
            ConnectorError::InvalidFilter { .. } => "INVALID_FILTER",
            ConnectorError::InvalidObject { .. } => "INVALID_OBJECT",
            ConnectorError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            ConnectorError::InvalidData { .. } => "INVALID_DATA",
            ConnectorError::TranslatorContract { .. } => "TRANSLATOR_CONTRACT",
            ConnectorError::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            ConnectorError::ObjectNotFound { .. } => "OBJECT_NOT_FOUND",
            ConnectorError::ObjectAlreadyExists { .. } => "OBJECT_EXISTS",
            ConnectorError::OperationFailed { .. } => "OPERATION_FAILED",
            ConnectorError::EncryptionFailed { .. } => "ENCRYPTION_FAILED",
            ConnectorError::DecryptionFailed { .. } => "DECRYPTION_FAILED",
            ConnectorError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    // Convenience constructors

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        ConnectorError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failed error with source.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an operation failed error.
    pub fn operation_failed(message: impl Into<String>) -> Self {
        ConnectorError::OperationFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create an invalid attribute error.
    pub fn invalid_attribute(name: impl Into<String>, message: impl Into<String>) -> Self {
        ConnectorError::InvalidAttribute {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid filter error.
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        ConnectorError::InvalidFilter {
            message: message.into(),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        ConnectorError::InvalidData {
            message: message.into(),
        }
    }

    /// Create a translator contract violation.
    pub fn translator_contract(message: impl Into<String>) -> Self {
        ConnectorError::TranslatorContract {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ConnectorError::Internal {
            message: message.into(),
            source: None,
        }
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
