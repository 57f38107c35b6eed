// Core infrastructure modules
pub mod config;
pub mod core;

// Provider modules
pub mod command;
pub mod manifest;
pub mod types;

pub use crate::core::{ProviderError, Result};
