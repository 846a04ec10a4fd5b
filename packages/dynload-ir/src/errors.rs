//! Error types for dynload-ir
//!
//! Provides unified error handling across the crate.

use thiserror::Error;

use crate::config::ConfigError;
use crate::features::program_view::errors::ViewError;
use crate::shared::models::ClassType;

/// Main error type for dynload-ir operations
#[derive(Debug, Error)]
pub enum DynloadError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Class bytes could not be turned into IR
    #[error("Parse error in {class}: {message}")]
    Parse { class: String, message: String },

    /// Class is not part of the program
    #[error("Unknown class: {0}")]
    UnknownClass(ClassType),

    /// Scoped view or call resolution failure
    #[error("View error: {0}")]
    View(#[from] ViewError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DynloadError {
    pub fn parse_error(class: impl Into<String>, message: impl Into<String>) -> Self {
        DynloadError::Parse {
            class: class.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for dynload operations
pub type Result<T> = std::result::Result<T, DynloadError>;
