//! Core error types

use thiserror::Error;

/// Errors raised while composing a tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// A component asked for a context value with no enclosing provider
    #[error("{context} must be used within its provider")]
    MissingProvider {
        /// Type name of the requested context value
        context: &'static str,
    },
}

/// Result type for composition operations
pub type Result<T> = std::result::Result<T, ContextError>;
