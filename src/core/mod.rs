/// Core Module
///
/// Shared infrastructure for the provider: the error type and the SQLite
/// plumbing that executes compiled commands and introspects existing tables.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{ProviderError, Result};
