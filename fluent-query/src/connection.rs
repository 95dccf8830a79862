//! Connections hand out per-collection query sessions.

use std::fmt;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::QueryConfig;
use crate::document::DocumentCompiler;
use crate::error::QueryResult;
use crate::executor::Executor;
use crate::identifier::{IdentifierCodec, LenientIdentifierCoercion, ObjectIdCodec};
use crate::namespace::Namespace;
use crate::query::Query;
use crate::value::ValueNormalizer;
use crate::version::ServerVersion;

/// An executor plus the configuration every session shares.
///
/// Cloning is cheap; clones share the executor and the cached server
/// version.
pub struct Connection<E> {
    executor: Arc<E>,
    config: Arc<QueryConfig>,
    codec: Arc<dyn IdentifierCodec>,
    compiler: DocumentCompiler,
    server_version: Arc<OnceCell<ServerVersion>>,
}

impl<E: Executor> Connection<E> {
    /// Create a connection using `ObjectId` primary keys.
    pub fn new(executor: E, config: QueryConfig) -> QueryResult<Self> {
        Self::with_codec(executor, config, Arc::new(ObjectIdCodec))
    }

    /// Create a connection with a custom identifier codec.
    pub fn with_codec(
        executor: E,
        config: QueryConfig,
        codec: Arc<dyn IdentifierCodec>,
    ) -> QueryResult<Self> {
        config.validate()?;
        let normalizer = ValueNormalizer::new(
            config.pk.clone(),
            LenientIdentifierCoercion::new(Arc::clone(&codec)),
        );
        Ok(Self {
            executor: Arc::new(executor),
            config: Arc::new(config),
            codec,
            compiler: DocumentCompiler::new(normalizer),
            server_version: Arc::new(OnceCell::new()),
        })
    }

    /// Open a query session on a collection.
    ///
    /// The session starts from default options. `name` may be qualified as
    /// `database.collection` to reach another database.
    pub fn collection(&self, name: &str) -> Query<E> {
        let namespace = Namespace::resolve(name, &self.config.database, &self.config.prefix);
        debug!(namespace = %namespace, "collection selected");
        Query::new(self.clone(), namespace)
    }

    /// The shared configuration.
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// The executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// The identifier codec.
    pub fn codec(&self) -> &dyn IdentifierCodec {
        self.codec.as_ref()
    }

    pub(crate) fn compiler(&self) -> &DocumentCompiler {
        &self.compiler
    }

    /// The server version: configured, or asked of the executor once.
    pub async fn server_version(&self) -> QueryResult<ServerVersion> {
        if let Some(version) = self.config.server_version {
            return Ok(version);
        }
        let version = self
            .server_version
            .get_or_try_init(|| async {
                let version = self.executor.server_version().await?;
                debug!(version = %version, "server version detected");
                Ok::<_, crate::error::QueryError>(version)
            })
            .await?;
        Ok(*version)
    }
}

impl<E> Clone for Connection<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            config: Arc::clone(&self.config),
            codec: Arc::clone(&self.codec),
            compiler: self.compiler.clone(),
            server_version: Arc::clone(&self.server_version),
        }
    }
}

impl<E> fmt::Debug for Connection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .field("server_version", &self.server_version.get())
            .finish()
    }
}
