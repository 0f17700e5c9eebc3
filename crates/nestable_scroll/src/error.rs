//! Scroll container error types

use nestable_core::ContextError;
use thiserror::Error;

/// Errors raised by the nestable scroll container
#[derive(Error, Debug)]
pub enum ScrollError {
    /// A scroll-coordinating component was built outside a container
    #[error("{context} must be used within a NestableScrollContainer")]
    MissingProvider {
        /// Type name of the requested context value
        context: &'static str,
    },

    /// Scroll props could not be parsed
    #[error("invalid scroll props: {0}")]
    Config(#[from] toml::de::Error),
}

impl ScrollError {
    /// Check whether this error signals a missing provider
    pub fn is_missing_provider(&self) -> bool {
        matches!(self, ScrollError::MissingProvider { .. })
    }
}

impl From<ContextError> for ScrollError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::MissingProvider { context } => ScrollError::MissingProvider { context },
        }
    }
}

/// Result type for scroll container operations
pub type Result<T> = std::result::Result<T, ScrollError>;
