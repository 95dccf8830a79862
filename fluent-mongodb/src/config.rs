//! Driver client configuration.

use std::time::Duration;

use fluent_query::{Acknowledgment as Ack, WriteConcern};
use mongodb::options::{
    Acknowledgment, ClientOptions, ReadPreference as DriverReadPreference, SelectionCriteria,
};

use crate::error::{MongoError, MongoResult};

/// Default connection string.
pub const DEFAULT_URI: &str = "mongodb://localhost:27017";

/// Client settings for [`crate::MongoExecutor`].
#[derive(Debug, Clone)]
pub struct MongoExecutorConfig {
    /// MongoDB connection URI.
    pub uri: String,
    /// Application name (shown in server logs).
    pub app_name: Option<String>,
    /// Minimum connection pool size.
    pub min_pool_size: Option<u32>,
    /// Maximum connection pool size.
    pub max_pool_size: Option<u32>,
    /// Maximum idle time for pooled connections.
    pub max_idle_time: Option<Duration>,
    /// Connection timeout.
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout.
    pub server_selection_timeout: Option<Duration>,
    /// Read preference for aggregate commands.
    pub read_preference: Option<ReadPreference>,
    /// Retry writes.
    pub retry_writes: Option<bool>,
    /// Retry reads.
    pub retry_reads: Option<bool>,
    /// Direct connection (bypass replica set discovery).
    pub direct_connection: Option<bool>,
}

/// Read preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPreference {
    /// Read from primary only.
    #[default]
    Primary,
    /// Read from primary preferred, fallback to secondary.
    PrimaryPreferred,
    /// Read from secondary only.
    Secondary,
    /// Read from secondary preferred, fallback to primary.
    SecondaryPreferred,
    /// Read from nearest member.
    Nearest,
}

impl ReadPreference {
    fn to_selection_criteria(self) -> SelectionCriteria {
        let preference = match self {
            ReadPreference::Primary => DriverReadPreference::Primary,
            ReadPreference::PrimaryPreferred => DriverReadPreference::PrimaryPreferred {
                options: Default::default(),
            },
            ReadPreference::Secondary => DriverReadPreference::Secondary {
                options: Default::default(),
            },
            ReadPreference::SecondaryPreferred => DriverReadPreference::SecondaryPreferred {
                options: Default::default(),
            },
            ReadPreference::Nearest => DriverReadPreference::Nearest {
                options: Default::default(),
            },
        };
        SelectionCriteria::ReadPreference(preference)
    }
}

/// Convert a write concern into the driver's representation.
pub fn driver_write_concern(wc: &WriteConcern) -> mongodb::options::WriteConcern {
    let acknowledgment = match &wc.w {
        Ack::W(n) => Acknowledgment::Nodes(*n),
        Ack::Majority => Acknowledgment::Majority,
        Ack::Custom(tag) => Acknowledgment::Custom(tag.clone()),
    };
    mongodb::options::WriteConcern::builder()
        .w(acknowledgment)
        .w_timeout(wc.wtimeout)
        .journal(wc.journal)
        .build()
}

impl Default for MongoExecutorConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            app_name: Some("mongo-fluent".to_string()),
            min_pool_size: None,
            max_pool_size: Some(10),
            max_idle_time: Some(Duration::from_secs(300)),
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(30)),
            read_preference: Some(ReadPreference::Primary),
            retry_writes: Some(true),
            retry_reads: Some(true),
            direct_connection: None,
        }
    }
}

impl MongoExecutorConfig {
    /// Create a configuration from a URI with defaults elsewhere.
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    /// Create a builder for configuration.
    pub fn builder() -> MongoExecutorConfigBuilder {
        MongoExecutorConfigBuilder::new()
    }

    /// Convert to driver client options.
    pub async fn to_client_options(&self) -> MongoResult<ClientOptions> {
        let mut options = ClientOptions::parse(&self.uri)
            .await
            .map_err(|e| MongoError::config(format!("failed to parse URI: {}", e)))?;

        if let Some(ref app_name) = self.app_name {
            options.app_name = Some(app_name.clone());
        }
        if let Some(min_pool) = self.min_pool_size {
            options.min_pool_size = Some(min_pool);
        }
        if let Some(max_pool) = self.max_pool_size {
            options.max_pool_size = Some(max_pool);
        }
        if let Some(max_idle) = self.max_idle_time {
            options.max_idle_time = Some(max_idle);
        }
        if let Some(connect_timeout) = self.connect_timeout {
            options.connect_timeout = Some(connect_timeout);
        }
        if let Some(selection_timeout) = self.server_selection_timeout {
            options.server_selection_timeout = Some(selection_timeout);
        }
        if let Some(read_pref) = self.read_preference {
            options.selection_criteria = Some(read_pref.to_selection_criteria());
        }
        if let Some(retry_writes) = self.retry_writes {
            options.retry_writes = Some(retry_writes);
        }
        if let Some(retry_reads) = self.retry_reads {
            options.retry_reads = Some(retry_reads);
        }
        if let Some(direct) = self.direct_connection {
            options.direct_connection = Some(direct);
        }

        Ok(options)
    }
}

/// Builder for executor configuration.
#[derive(Debug, Default)]
pub struct MongoExecutorConfigBuilder {
    config: Option<MongoExecutorConfig>,
}

impl MongoExecutorConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn config(&mut self) -> &mut MongoExecutorConfig {
        self.config.get_or_insert_with(MongoExecutorConfig::default)
    }

    /// Set the MongoDB URI.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.config().uri = uri.into();
        self
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.config().app_name = Some(name.into());
        self
    }

    /// Set the minimum pool size.
    pub fn min_pool_size(mut self, size: u32) -> Self {
        self.config().min_pool_size = Some(size);
        self
    }

    /// Set the maximum pool size.
    pub fn max_pool_size(mut self, size: u32) -> Self {
        self.config().max_pool_size = Some(size);
        self
    }

    /// Set the maximum idle time for connections.
    pub fn max_idle_time(mut self, duration: Duration) -> Self {
        self.config().max_idle_time = Some(duration);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.config().connect_timeout = Some(duration);
        self
    }

    /// Set the server selection timeout.
    pub fn server_selection_timeout(mut self, duration: Duration) -> Self {
        self.config().server_selection_timeout = Some(duration);
        self
    }

    /// Set the read preference.
    pub fn read_preference(mut self, pref: ReadPreference) -> Self {
        self.config().read_preference = Some(pref);
        self
    }

    /// Enable or disable retry writes.
    pub fn retry_writes(mut self, enabled: bool) -> Self {
        self.config().retry_writes = Some(enabled);
        self
    }

    /// Enable or disable retry reads.
    pub fn retry_reads(mut self, enabled: bool) -> Self {
        self.config().retry_reads = Some(enabled);
        self
    }

    /// Enable direct connection (bypass replica set discovery).
    pub fn direct_connection(mut self, enabled: bool) -> Self {
        self.config().direct_connection = Some(enabled);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> MongoResult<MongoExecutorConfig> {
        let config = self.config.unwrap_or_default();
        if !config.uri.starts_with("mongodb://") && !config.uri.starts_with("mongodb+srv://") {
            return Err(MongoError::config(format!(
                "unsupported URI scheme in '{}'",
                config.uri
            )));
        }
        if let (Some(min), Some(max)) = (config.min_pool_size, config.max_pool_size) {
            if min > max {
                return Err(MongoError::config(format!(
                    "min pool size {} exceeds max pool size {}",
                    min, max
                )));
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_uri() {
        let config = MongoExecutorConfig::from_uri("mongodb://db:27017");
        assert_eq!(config.uri, "mongodb://db:27017");
        assert_eq!(config.max_pool_size, Some(10));
    }

    #[test]
    fn test_config_builder() {
        let config = MongoExecutorConfig::builder()
            .uri("mongodb://localhost:27017")
            .app_name("test-app")
            .max_pool_size(20)
            .read_preference(ReadPreference::Nearest)
            .build()
            .unwrap();

        assert_eq!(config.app_name, Some("test-app".to_string()));
        assert_eq!(config.max_pool_size, Some(20));
        assert_eq!(config.read_preference, Some(ReadPreference::Nearest));
    }

    #[test]
    fn test_config_builder_rejects_bad_values() {
        assert!(MongoExecutorConfig::builder().uri("http://x").build().is_err());
        assert!(
            MongoExecutorConfig::builder()
                .min_pool_size(5)
                .max_pool_size(2)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_driver_write_concern() {
        let wc = driver_write_concern(&WriteConcern::majority());
        assert_eq!(wc.w, Some(Acknowledgment::Majority));
        assert_eq!(wc.w_timeout, None);
        assert_eq!(wc.journal, None);

        let wc = driver_write_concern(
            &WriteConcern::nodes(2)
                .with_timeout(Duration::from_millis(1000))
                .with_journal(false),
        );
        assert_eq!(wc.w, Some(Acknowledgment::Nodes(2)));
        assert_eq!(wc.w_timeout, Some(Duration::from_secs(1)));
        assert_eq!(wc.journal, Some(false));

        let wc = driver_write_concern(&WriteConcern::tag("east"));
        assert_eq!(wc.w, Some(Acknowledgment::Custom("east".into())));
    }

    #[tokio::test]
    async fn test_to_client_options() {
        let config = MongoExecutorConfig::builder()
            .uri("mongodb://localhost:27017")
            .app_name("fluent")
            .max_pool_size(4)
            .build()
            .unwrap();

        let options = config.to_client_options().await.unwrap();
        assert_eq!(options.app_name.as_deref(), Some("fluent"));
        assert_eq!(options.max_pool_size, Some(4));
    }
}
