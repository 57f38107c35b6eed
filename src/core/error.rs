/// Provider Error Module
///
/// This module defines the error type shared by the type mapper, the command
/// compiler and the execution helpers. Every error is terminal for the call
/// that produced it; nothing in this crate retries.
use thiserror::Error;

/// Comprehensive error type for the provider.
///
/// The first four variants describe mistakes in the caller's schema or plan:
/// - malformed input to a public operation
/// - a conceptual kind or store type name without a mapping
/// - a structurally forbidden combination
/// - a request for manifest information this provider cannot supply
///
/// The remaining variants wrap the ambient failures of configuration,
/// serialization and SQLite itself.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Malformed input to a public operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A conceptual kind or store type with no defined mapping
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// A structurally forbidden combination, e.g. generated parameters on a query
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The manifest was asked for information the provider cannot produce
    #[error("Provider incompatible: {0}")]
    ProviderIncompatible(String),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database-related errors from SQLite operations
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors (plans, configuration)
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ProviderError {
    /// Builds the error raised when a store type name has no mapping.
    pub fn unsupported_store_type(name: &str) -> Self {
        ProviderError::UnsupportedType(format!(
            "The underlying provider does not support the type '{}'.",
            name
        ))
    }
}

/// Type alias for Result to use ProviderError as the error type.
pub type Result<T> = std::result::Result<T, ProviderError>;
