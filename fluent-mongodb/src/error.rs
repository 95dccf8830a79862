//! Error types for the MongoDB executor.

use fluent_query::QueryError;
use thiserror::Error;

/// Result type for MongoDB executor operations.
pub type MongoResult<T> = Result<T, MongoError>;

/// Errors raised while talking to the server.
#[derive(Error, Debug)]
pub enum MongoError {
    /// MongoDB driver error.
    #[error("mongodb error: {0}")]
    Driver(#[from] mongodb::error::Error),

    /// BSON serialization error.
    #[error("bson error: {0}")]
    Bson(#[from] bson::ser::Error),

    /// BSON deserialization error.
    #[error("bson deserialization error: {0}")]
    BsonDe(#[from] bson::de::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// The server answered with an unexpected shape.
    #[error("malformed reply to {command}: {message}")]
    MalformedReply {
        /// Command that was run.
        command: String,
        /// What was wrong.
        message: String,
    },
}

impl MongoError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a malformed reply error.
    pub fn malformed_reply(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedReply {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if this is a malformed reply.
    pub fn is_malformed_reply(&self) -> bool {
        matches!(self, Self::MalformedReply { .. })
    }
}

impl From<MongoError> for QueryError {
    fn from(err: MongoError) -> Self {
        match err {
            MongoError::Bson(e) => QueryError::serialization(e.to_string()),
            MongoError::BsonDe(e) => QueryError::serialization(e.to_string()),
            MongoError::Config(msg) => QueryError::config(msg),
            other => QueryError::executor(other.to_string()),
        }
    }
}
