//! Query layer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::logging;
use crate::version::ServerVersion;

/// Default primary-key field.
pub const DEFAULT_PK: &str = "_id";
/// Default page size used by `page()` when no limit is set.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Nodes that must acknowledge a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acknowledgment {
    /// Acknowledge writes from the specified number of nodes.
    W(u32),
    /// Acknowledge writes from majority of nodes.
    Majority,
    /// Custom tag set.
    Custom(String),
}

/// Write acknowledgement requested for bulk writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteConcern {
    /// Who acknowledges.
    pub w: Acknowledgment,
    /// How long the server waits for acknowledgement before failing the write.
    #[serde(default)]
    pub wtimeout: Option<Duration>,
    /// Wait for the journal commit.
    #[serde(default)]
    pub journal: Option<bool>,
}

impl WriteConcern {
    /// Acknowledge once `w` is satisfied, with no timeout or journal requirement.
    pub fn new(w: Acknowledgment) -> Self {
        Self {
            w,
            wtimeout: None,
            journal: None,
        }
    }

    /// Acknowledge from `n` nodes.
    pub fn nodes(n: u32) -> Self {
        Self::new(Acknowledgment::W(n))
    }

    /// Acknowledge from a majority of nodes.
    pub fn majority() -> Self {
        Self::new(Acknowledgment::Majority)
    }

    /// Acknowledge from the members of a tag set.
    pub fn tag(name: impl Into<String>) -> Self {
        Self::new(Acknowledgment::Custom(name.into()))
    }

    /// Fail the write when acknowledgement takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.wtimeout = Some(timeout);
        self
    }

    /// Require (or waive) the journal commit.
    pub fn with_journal(mut self, journal: bool) -> Self {
        self.journal = Some(journal);
        self
    }
}

/// Configuration shared by every query session of a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Database used for collection names without a `db.` part.
    pub database: String,
    /// Prefix prepended to collection names without a `db.` part.
    pub prefix: String,
    /// Primary-key field name.
    pub pk: String,
    /// Rows per page for `page()` when no limit was set.
    pub page_size: u64,
    /// Record the last executed statement.
    pub debug: bool,
    /// Known server version. Asked of the executor when absent.
    pub server_version: Option<ServerVersion>,
    /// Write concern attached to every bulk write.
    pub write_concern: Option<WriteConcern>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            database: String::new(),
            prefix: String::new(),
            pk: DEFAULT_PK.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            debug: logging::is_debug_enabled(),
            server_version: None,
            write_concern: None,
        }
    }
}

impl QueryConfig {
    /// Create a configuration for a database with defaults elsewhere.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    /// Create a builder for configuration.
    pub fn builder() -> QueryConfigBuilder {
        QueryConfigBuilder::new()
    }

    /// Check the configuration for unusable values.
    pub fn validate(&self) -> QueryResult<()> {
        if self.pk.trim().is_empty() {
            return Err(QueryError::config("primary key field name is empty"));
        }
        if self.page_size == 0 {
            return Err(QueryError::config("page size must be positive"));
        }
        if self.database.contains('.') {
            return Err(QueryError::config(format!(
                "database name '{}' contains '.'",
                self.database
            )));
        }
        Ok(())
    }
}

/// Builder for query configuration.
#[derive(Debug, Default)]
pub struct QueryConfigBuilder {
    database: Option<String>,
    prefix: Option<String>,
    pk: Option<String>,
    page_size: Option<u64>,
    debug: Option<bool>,
    server_version: Option<ServerVersion>,
    write_concern: Option<WriteConcern>,
}

impl QueryConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default database.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the collection prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set the primary-key field name.
    pub fn pk(mut self, pk: impl Into<String>) -> Self {
        self.pk = Some(pk.into());
        self
    }

    /// Set the page size.
    pub fn page_size(mut self, rows: u64) -> Self {
        self.page_size = Some(rows);
        self
    }

    /// Enable or disable statement tracing.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = Some(enabled);
        self
    }

    /// Pin the server version instead of asking the executor.
    pub fn server_version(mut self, version: ServerVersion) -> Self {
        self.server_version = Some(version);
        self
    }

    /// Set the write concern.
    pub fn write_concern(mut self, wc: WriteConcern) -> Self {
        self.write_concern = Some(wc);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> QueryResult<QueryConfig> {
        let defaults = QueryConfig::default();
        let config = QueryConfig {
            database: self.database.unwrap_or(defaults.database),
            prefix: self.prefix.unwrap_or(defaults.prefix),
            pk: self.pk.unwrap_or(defaults.pk),
            page_size: self.page_size.unwrap_or(defaults.page_size),
            debug: self.debug.unwrap_or(defaults.debug),
            server_version: self.server_version,
            write_concern: self.write_concern,
        };
        config.validate()?;
        Ok(config)
    }
}
