//! The driver-backed executor.

use std::sync::Arc;

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use fluent_query::{BulkWrite, Executor, QueryResult, ServerVersion, WriteModel, WriteResult};
use futures::TryStreamExt;
use mongodb::options::{DeleteOptions, InsertManyOptions, UpdateOptions};
use mongodb::{Client, Collection};
use tracing::{debug, info};

use crate::config::{MongoExecutorConfig, driver_write_concern};
use crate::error::{MongoError, MongoResult};

/// Runs compiled statements with the official MongoDB driver.
///
/// The driver pools connections internally; clones share the pool.
#[derive(Clone)]
pub struct MongoExecutor {
    client: Client,
    config: Arc<MongoExecutorConfig>,
}

impl MongoExecutor {
    /// Connect with the given configuration.
    pub async fn connect(config: MongoExecutorConfig) -> MongoResult<Self> {
        let options = config.to_client_options().await?;
        let client = Client::with_options(options)
            .map_err(|e| MongoError::connection(format!("failed to create client: {}", e)))?;

        info!(uri = %config.uri, "MongoDB client created");

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Wrap an existing driver client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            config: Arc::new(MongoExecutorConfig::default()),
        }
    }

    /// The underlying driver client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// The configuration.
    pub fn config(&self) -> &MongoExecutorConfig {
        &self.config
    }

    /// Check if the server answers a ping.
    pub async fn is_healthy(&self) -> bool {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .is_ok()
    }

    async fn run_bulk(&self, bulk: &BulkWrite) -> MongoResult<WriteResult> {
        let namespace = bulk.namespace();
        let collection: Collection<Document> = self
            .client
            .database(namespace.database())
            .collection(namespace.collection());
        let write_concern = bulk.write_concern().map(driver_write_concern);

        let mut result = WriteResult::default();
        let mut pending_inserts = Vec::new();

        for operation in bulk.operations() {
            if let WriteModel::Insert { document } = operation {
                pending_inserts.push(document.clone());
                continue;
            }
            result.merge(
                flush_inserts(&collection, &mut pending_inserts, write_concern.clone()).await?,
            );

            match operation {
                WriteModel::Update {
                    filter,
                    update,
                    multi,
                    upsert,
                } => {
                    let options = UpdateOptions::builder()
                        .upsert(*upsert)
                        .write_concern(write_concern.clone())
                        .build();
                    let reply = if *multi {
                        collection
                            .update_many(filter.clone(), update.clone(), options)
                            .await?
                    } else {
                        collection
                            .update_one(filter.clone(), update.clone(), options)
                            .await?
                    };
                    result.merge(WriteResult {
                        matched_count: reply.matched_count,
                        modified_count: reply.modified_count,
                        upserted_count: u64::from(reply.upserted_id.is_some()),
                        ..WriteResult::default()
                    });
                }
                WriteModel::Delete { filter, just_one } => {
                    let options = DeleteOptions::builder()
                        .write_concern(write_concern.clone())
                        .build();
                    let reply = if *just_one {
                        collection.delete_one(filter.clone(), options).await?
                    } else {
                        collection.delete_many(filter.clone(), options).await?
                    };
                    result.deleted_count += reply.deleted_count;
                }
                WriteModel::Insert { .. } => {}
            }
        }
        result.merge(flush_inserts(&collection, &mut pending_inserts, write_concern).await?);

        Ok(result)
    }

    async fn run_command(&self, database: &str, command: Document) -> MongoResult<Vec<Document>> {
        let db = self.client.database(database);

        let aggregate = command.get_str("aggregate").ok().map(str::to_string);
        let Some(collection) = aggregate else {
            let reply = db.run_command(command, None).await?;
            return Ok(vec![reply]);
        };

        let pipeline = match command.get("pipeline") {
            Some(Bson::Array(stages)) => stages
                .iter()
                .map(|stage| match stage {
                    Bson::Document(stage) => Ok(stage.clone()),
                    other => Err(MongoError::malformed_reply(
                        "aggregate",
                        format!("pipeline stage is not a document: {}", other),
                    )),
                })
                .collect::<MongoResult<Vec<Document>>>()?,
            _ => Vec::new(),
        };

        let cursor = db
            .collection::<Document>(&collection)
            .aggregate(pipeline, None)
            .await?;
        let rows: Vec<Document> = cursor.try_collect().await?;
        debug!(collection = %collection, rows = rows.len(), "aggregate drained");
        Ok(rows)
    }

    async fn build_info(&self) -> MongoResult<ServerVersion> {
        let reply = self
            .client
            .database("admin")
            .run_command(doc! { "buildInfo": 1 }, None)
            .await?;
        let version = reply
            .get_str("version")
            .map_err(|_| MongoError::malformed_reply("buildInfo", "missing version"))?;
        ServerVersion::parse(version)
            .map_err(|e| MongoError::malformed_reply("buildInfo", e.to_string()))
    }
}

async fn flush_inserts(
    collection: &Collection<Document>,
    pending: &mut Vec<Document>,
    write_concern: Option<mongodb::options::WriteConcern>,
) -> MongoResult<WriteResult> {
    if pending.is_empty() {
        return Ok(WriteResult::default());
    }
    let options = InsertManyOptions::builder()
        .ordered(true)
        .write_concern(write_concern)
        .build();
    let reply = collection
        .insert_many(std::mem::take(pending), options)
        .await?;
    Ok(WriteResult {
        inserted_count: reply.inserted_ids.len() as u64,
        ..WriteResult::default()
    })
}

#[async_trait]
impl Executor for MongoExecutor {
    async fn execute_bulk_write(&self, bulk: &BulkWrite) -> QueryResult<WriteResult> {
        debug!(namespace = %bulk.namespace(), operations = bulk.len(), "Executing bulk write");
        Ok(self.run_bulk(bulk).await?)
    }

    async fn execute_command(
        &self,
        database: &str,
        command: Document,
    ) -> QueryResult<Vec<Document>> {
        debug!(database = %database, command = %command, "Executing command");
        Ok(self.run_command(database, command).await?)
    }

    async fn server_version(&self) -> QueryResult<ServerVersion> {
        Ok(self.build_info().await?)
    }
}

impl std::fmt::Debug for MongoExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoExecutor")
            .field("config", &self.config)
            .finish()
    }
}
