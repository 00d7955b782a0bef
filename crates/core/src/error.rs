//! Error types for the pagination domain layer.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`QueryError`] - Rejected client input (filter keys, values, paging parameters)
//! - [`StorageError`] - Database/repository errors
//! - [`PaginationError`] - Top-level error returned by the engine
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Query Errors
// =============================================================================

/// Client input that cannot be turned into a query.
///
/// Every variant is a client error: the request is rejected as a whole and
/// no partial result is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A `where__`/`order__` key does not split into a valid number of segments.
    #[error("Malformed filter key '{key}': expected prefix__field or where__field__operator")]
    MalformedFilterKey { key: String },

    /// A three-segment `where__` key names an operator the registry does not know.
    #[error("Unknown operator '{operator}' on field '{field}'")]
    UnknownOperator { field: String, operator: String },

    /// The key names a field that is not part of the resource.
    #[error("Unknown field '{field}'")]
    UnknownField { field: String },

    /// The operator exists but cannot compare values of this field's type.
    #[error("Operator '{operator}' cannot be applied to field '{field}'")]
    OperatorNotApplicable { field: String, operator: String },

    /// The raw value could not be coerced to the field's type.
    #[error("Invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// `page` or `take` is not a positive integer.
    #[error("Invalid '{name}' parameter '{value}': expected a positive integer")]
    InvalidParameter { name: String, value: String },
}

impl QueryError {
    /// Short machine-readable label, used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedFilterKey { .. } => "malformed_filter_key",
            Self::UnknownOperator { .. } => "unknown_operator",
            Self::UnknownField { .. } => "unknown_field",
            Self::OperatorNotApplicable { .. } => "operator_not_applicable",
            Self::InvalidValue { .. } => "invalid_value",
            Self::InvalidParameter { .. } => "invalid_parameter",
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Database and repository errors.
///
/// These errors originate from storage operations like queries and row
/// decoding. They are fatal for the request and never retried here.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to establish database connection.
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// SQL query execution failed.
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// Database migration failed.
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// Data serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// =============================================================================
// Pagination Errors
// =============================================================================

/// Top-level error returned by [`crate::pagination::PaginationEngine`].
#[derive(Debug, Error)]
pub enum PaginationError {
    /// The request was rejected before reaching the store.
    #[error("Invalid query: {0}")]
    Query(#[from] QueryError),

    /// The store failed while serving the request.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl PaginationError {
    /// Whether the caller should surface this as a client error.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Query(_))
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for query parsing and spec building.
pub type QueryResult<T> = Result<T, QueryError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for engine operations.
pub type PaginationResult<T> = Result<T, PaginationError>;
