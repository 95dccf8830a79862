//! An in-memory executor for tests.
//!
//! [`RecordingExecutor`] keeps every bulk write and command it receives and
//! answers with canned rows and write counters:
//!
//! ```rust,ignore
//! let executor = RecordingExecutor::new().with_rows(vec![doc! { "name": "Ann" }]);
//! let connection = Connection::new(executor, QueryConfig::new("app"))?;
//! let rows = connection.collection("users").select().await?;
//! assert_eq!(connection.executor().commands().len(), 1);
//! ```

use std::collections::VecDeque;

use async_trait::async_trait;
use bson::Document;
use parking_lot::Mutex;

use crate::error::{QueryError, QueryResult};
use crate::executor::Executor;
use crate::version::ServerVersion;
use crate::write::{BulkWrite, WriteModel, WriteResult};

/// A command received by [`RecordingExecutor`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCommand {
    /// Target database.
    pub database: String,
    /// The command document.
    pub command: Document,
}

#[derive(Debug, Default)]
struct State {
    bulk_writes: Vec<BulkWrite>,
    commands: Vec<RecordedCommand>,
    rows: VecDeque<Vec<Document>>,
    write_results: VecDeque<WriteResult>,
    fail_next: Option<String>,
    version_requests: usize,
}

/// Executor that records requests instead of talking to a server.
#[derive(Debug)]
pub struct RecordingExecutor {
    state: Mutex<State>,
    version: ServerVersion,
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingExecutor {
    /// Create an executor reporting the current default server version.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            version: ServerVersion::default(),
        }
    }

    /// Report `version` from `server_version`.
    pub fn with_version(mut self, version: ServerVersion) -> Self {
        self.version = version;
        self
    }

    /// Queue rows for the next command.
    pub fn with_rows(self, rows: Vec<Document>) -> Self {
        self.push_rows(rows);
        self
    }

    /// Queue rows for the next command that has none queued.
    pub fn push_rows(&self, rows: Vec<Document>) {
        self.state.lock().rows.push_back(rows);
    }

    /// Queue the counters returned by the next bulk write.
    ///
    /// Without one, counters are derived from the operations.
    pub fn push_write_result(&self, result: WriteResult) {
        self.state.lock().write_results.push_back(result);
    }

    /// Make the next call fail with an executor error.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.state.lock().fail_next = Some(message.into());
    }

    /// Bulk writes received so far.
    pub fn bulk_writes(&self) -> Vec<BulkWrite> {
        self.state.lock().bulk_writes.clone()
    }

    /// The most recent bulk write.
    pub fn last_bulk_write(&self) -> Option<BulkWrite> {
        self.state.lock().bulk_writes.last().cloned()
    }

    /// Commands received so far.
    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.state.lock().commands.clone()
    }

    /// The most recent command.
    pub fn last_command(&self) -> Option<RecordedCommand> {
        self.state.lock().commands.last().cloned()
    }

    /// How many times the server version was asked for.
    pub fn version_requests(&self) -> usize {
        self.state.lock().version_requests
    }

    fn take_failure(state: &mut State) -> QueryResult<()> {
        match state.fail_next.take() {
            Some(message) => Err(QueryError::executor(message)),
            None => Ok(()),
        }
    }
}

fn derived_result(bulk: &BulkWrite) -> WriteResult {
    let mut result = WriteResult::default();
    for operation in bulk.operations() {
        match operation {
            WriteModel::Insert { .. } => result.inserted_count += 1,
            WriteModel::Update { .. } => {
                result.matched_count += 1;
                result.modified_count += 1;
            }
            WriteModel::Delete { .. } => result.deleted_count += 1,
        }
    }
    result
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn execute_bulk_write(&self, bulk: &BulkWrite) -> QueryResult<WriteResult> {
        let mut state = self.state.lock();
        state.bulk_writes.push(bulk.clone());
        Self::take_failure(&mut state)?;
        Ok(state
            .write_results
            .pop_front()
            .unwrap_or_else(|| derived_result(bulk)))
    }

    async fn execute_command(
        &self,
        database: &str,
        command: Document,
    ) -> QueryResult<Vec<Document>> {
        let mut state = self.state.lock();
        state.commands.push(RecordedCommand {
            database: database.to_string(),
            command,
        });
        Self::take_failure(&mut state)?;
        Ok(state.rows.pop_front().unwrap_or_default())
    }

    async fn server_version(&self) -> QueryResult<ServerVersion> {
        let mut state = self.state.lock();
        state.version_requests += 1;
        Self::take_failure(&mut state)?;
        Ok(self.version)
    }
}
