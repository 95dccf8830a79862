//! The executor collaborator.
//!
//! The query layer compiles statements; an [`Executor`] runs them. The
//! `fluent-mongodb` crate provides one backed by the official driver, and
//! [`crate::testing::RecordingExecutor`] records what it is given.

use async_trait::async_trait;
use bson::Document;

use crate::error::QueryResult;
use crate::version::ServerVersion;
use crate::write::{BulkWrite, WriteResult};

/// Runs compiled bulk writes and database commands.
///
/// Retries, timeouts and cancellation are the executor's business; the
/// query layer issues one call per terminal operation and awaits it.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute a bulk write in one round trip.
    async fn execute_bulk_write(&self, bulk: &BulkWrite) -> QueryResult<WriteResult>;

    /// Run a cursor-returning command and materialize every row.
    async fn execute_command(&self, database: &str, command: Document)
    -> QueryResult<Vec<Document>>;

    /// Report the server version.
    async fn server_version(&self) -> QueryResult<ServerVersion>;
}
