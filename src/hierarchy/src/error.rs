//! Error types for the role hierarchy optimizer

use thiserror::Error;

/// Role hierarchy analysis errors
#[derive(Debug, Error)]
pub enum HierarchyError {
    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A combinatorial search ran past its step budget
    #[error("Enumeration budget exceeded during {operation} (limit: {limit})")]
    EnumerationBudgetExceeded {
        /// Name of the traversal that gave up
        operation: &'static str,
        /// Budget that was in effect
        limit: usize,
    },

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for hierarchy operations
pub type Result<T> = std::result::Result<T, HierarchyError>;
