//! # fluent-query
//!
//! A fluent query builder that compiles chained calls into MongoDB bulk
//! writes and aggregation commands.
//!
//! This crate provides:
//! - Per-collection query sessions with chainable options
//! - Normalization of insert, update and filter documents
//! - Aggregation pipeline compilation with a `$count` fallback for old servers
//! - Statement tracing for debugging
//!
//! Execution is delegated to an [`Executor`]; `fluent-mongodb` supplies one
//! backed by the official driver.
//!
//! ## Example
//!
//! ```rust,ignore
//! use fluent_query::prelude::*;
//!
//! let connection = Connection::new(executor, QueryConfig::new("app"))?;
//! let mut users = connection.collection("users");
//!
//! users.insert(doc! { "name": "Ann", "age": 30 }).await?;
//! users.where_(doc! { "name": "Ann" }).set_inc("age", 1).await?;
//!
//! let oldest = users.field("name,age").sort(doc! { "age": -1 }).limit(3).select().await?;
//! let total = users.count().await?;
//! ```

pub mod command;
pub mod config;
pub mod connection;
pub mod document;
pub mod error;
pub mod executor;
pub mod identifier;
pub mod logging;
pub mod namespace;
pub mod options;
pub mod pipeline;
pub mod projection;
pub mod query;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod trace;
pub mod value;
pub mod version;
pub mod write;

pub use bson::oid::ObjectId;
pub use bson::{Bson, Document, doc};
pub use config::{Acknowledgment, QueryConfig, QueryConfigBuilder, WriteConcern};
pub use connection::Connection;
pub use error::{QueryError, QueryResult};
pub use executor::Executor;
pub use identifier::{IdentifierCodec, LenientIdentifierCoercion, ObjectIdCodec};
pub use namespace::Namespace;
pub use options::{OptionKey, QueryOptions};
pub use projection::Fields;
pub use query::{Column, InsertManyResult, LastInsertedIds, Query};
pub use version::ServerVersion;
pub use write::{BulkWrite, WriteModel, WriteResult};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{Acknowledgment, QueryConfig, QueryConfigBuilder, WriteConcern};
    pub use crate::connection::Connection;
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::executor::Executor;
    pub use crate::options::OptionKey;
    pub use crate::projection::Fields;
    pub use crate::query::{Column, InsertManyResult, LastInsertedIds, Query};
    pub use crate::version::ServerVersion;
    pub use crate::write::{BulkWrite, WriteModel, WriteResult};
    pub use bson::oid::ObjectId;
    pub use bson::{Bson, Document, doc};
}
