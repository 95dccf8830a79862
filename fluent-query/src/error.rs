//! Error types for statement compilation and execution.

use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors surfaced by terminal query operations.
///
/// Structural problems with a statement (missing filter, empty payload,
/// unresolved database) are reported here. "Not found" is never an error:
/// `find`, `value` and friends return empty results instead.
#[derive(Error, Debug)]
pub enum QueryError {
    /// An insert had no fields left after normalization.
    #[error("no data to insert")]
    EmptyDocument,

    /// An update compiled to no operators.
    #[error("no data to update")]
    EmptyUpdate,

    /// An update or delete was issued without a `where` condition.
    #[error("missing {0} condition")]
    MissingCondition(&'static str),

    /// The namespace did not resolve to a database.
    #[error("undefined database for namespace '{0}'")]
    MissingDatabase(String),

    /// The namespace did not resolve to a collection, e.g. `"app."`.
    #[error("undefined collection for namespace '{0}'")]
    MissingCollection(String),

    /// An argument that cannot be turned into a statement.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A malformed identifier string.
    ///
    /// Only the codec itself reports this; normalization recovers from it.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Failure reported by the executor collaborator.
    #[error("executor error: {0}")]
    Executor(String),

    /// Document (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl QueryError {
    /// Create a missing-condition error for the given operation.
    pub fn missing_condition(operation: &'static str) -> Self {
        Self::MissingCondition(operation)
    }

    /// Create a missing-database error.
    pub fn missing_database(namespace: impl Into<String>) -> Self {
        Self::MissingDatabase(namespace.into())
    }

    /// Create a missing-collection error.
    pub fn missing_collection(namespace: impl Into<String>) -> Self {
        Self::MissingCollection(namespace.into())
    }

    /// Create an invalid-value error.
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an executor error.
    pub fn executor(message: impl Into<String>) -> Self {
        Self::Executor(message.into())
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Check if this is an empty insert payload.
    pub fn is_empty_document(&self) -> bool {
        matches!(self, Self::EmptyDocument)
    }

    /// Check if this is an empty update payload.
    pub fn is_empty_update(&self) -> bool {
        matches!(self, Self::EmptyUpdate)
    }

    /// Check if this is a missing `where` condition.
    pub fn is_missing_condition(&self) -> bool {
        matches!(self, Self::MissingCondition(_))
    }

    /// Check if this is an unresolved database.
    pub fn is_missing_database(&self) -> bool {
        matches!(self, Self::MissingDatabase(_))
    }

    /// Check if this is an unresolved collection.
    pub fn is_missing_collection(&self) -> bool {
        matches!(self, Self::MissingCollection(_))
    }

    /// Check if this is an unusable argument.
    pub fn is_invalid_value(&self) -> bool {
        matches!(self, Self::InvalidValue(_))
    }

    /// Check if the executor collaborator failed.
    pub fn is_executor_error(&self) -> bool {
        matches!(self, Self::Executor(_))
    }
}

impl From<bson::oid::Error> for QueryError {
    fn from(err: bson::oid::Error) -> Self {
        QueryError::InvalidIdentifier(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(QueryError::EmptyDocument.to_string(), "no data to insert");
        assert_eq!(QueryError::EmptyUpdate.to_string(), "no data to update");
        assert_eq!(
            QueryError::missing_condition("delete").to_string(),
            "missing delete condition"
        );
        assert_eq!(
            QueryError::missing_database(".users").to_string(),
            "undefined database for namespace '.users'"
        );
        assert_eq!(
            QueryError::invalid_value("cannot decrement 'x'").to_string(),
            "invalid value: cannot decrement 'x'"
        );
    }

    #[test]
    fn test_error_predicates() {
        assert!(QueryError::EmptyDocument.is_empty_document());
        assert!(QueryError::EmptyUpdate.is_empty_update());
        assert!(QueryError::missing_condition("update").is_missing_condition());
        assert!(QueryError::missing_database("x").is_missing_database());
        assert!(QueryError::executor("boom").is_executor_error());
        assert!(QueryError::missing_collection("app.").is_missing_collection());
        assert!(QueryError::invalid_value("step").is_invalid_value());
        assert!(!QueryError::missing_collection("app.").is_missing_database());
        assert!(!QueryError::EmptyUpdate.is_empty_document());
    }

    #[test]
    fn test_from_oid_error() {
        let err: QueryError = bson::oid::ObjectId::parse_str("nope").unwrap_err().into();
        assert!(matches!(err, QueryError::InvalidIdentifier(_)));
    }
}
