//! The fluent query session.
//!
//! A [`Query`] accumulates options through chained calls and compiles them
//! when a terminal operation runs:
//!
//! ```rust,ignore
//! let mut users = connection.collection("users");
//!
//! users
//!     .where_(doc! { "name": "Ann" })
//!     .limit(1)
//!     .update(doc! { "age": ["$inc", 1] })
//!     .await?;
//!
//! let rows = users.field("name,age").sort(doc! { "age": -1 }).limit(3).select().await?;
//! ```
//!
//! Options are reset to defaults after every terminal operation, whether it
//! succeeded or not, so one statement never leaks its filter, sort or limit
//! into the next.

use bson::{Bson, Document};
use indexmap::IndexMap;
use tracing::debug;

use crate::command::AggregateCommand;
use crate::connection::Connection;
use crate::error::{QueryError, QueryResult};
use crate::executor::Executor;
use crate::identifier::IdentifierCodec;
use crate::namespace::Namespace;
use crate::options::{OptionKey, QueryOptions};
use crate::pipeline::PipelineCompiler;
use crate::projection::Fields;
use crate::trace::{Statement, StatementTracer};
use crate::version::ServerVersion;
use crate::write::{BulkWrite, WriteResult};

/// Output label of the count stage used by [`Query::count`].
pub const COUNT_LABEL: &str = "__count__";

/// Identifiers produced by the last insert of a session.
#[derive(Debug, Clone, PartialEq)]
pub enum LastInsertedIds {
    /// From `insert`.
    One(Bson),
    /// From `insert_all`, parallel to the inserted documents.
    Many(Vec<Bson>),
}

impl LastInsertedIds {
    /// The identifiers as a slice.
    pub fn as_slice(&self) -> &[Bson] {
        match self {
            LastInsertedIds::One(id) => std::slice::from_ref(id),
            LastInsertedIds::Many(ids) => ids,
        }
    }

    /// The identifiers in string form.
    pub fn to_strings(&self, codec: &dyn IdentifierCodec) -> Vec<String> {
        self.as_slice().iter().map(|id| codec.id_to_string(id)).collect()
    }
}

/// Outcome of [`Query::insert_all`].
#[derive(Debug, Clone, PartialEq)]
pub struct InsertManyResult {
    /// Documents inserted.
    pub inserted_count: u64,
    /// Identifiers in input order, empty documents excluded.
    pub inserted_ids: Vec<Bson>,
}

/// Outcome of [`Query::column`].
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// One field: its values, in row order.
    Values(Vec<Bson>),
    /// Several fields: rows keyed by the first field's value.
    Keyed(IndexMap<String, Document>),
}

/// A query session on one collection.
pub struct Query<E> {
    connection: Connection<E>,
    namespace: Namespace,
    options: QueryOptions,
    tracer: StatementTracer,
    last_insert: Option<LastInsertedIds>,
}

impl<E: Executor> Query<E> {
    pub(crate) fn new(connection: Connection<E>, namespace: Namespace) -> Self {
        let tracer = StatementTracer::new(connection.config().debug);
        Self {
            connection,
            namespace,
            options: QueryOptions::new(),
            tracer,
            last_insert: None,
        }
    }

    /// The target namespace.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// The options accumulated so far.
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// The last successfully executed statement, when tracing is enabled.
    ///
    /// Statements the executor rejected are not recorded.
    pub fn last_statement(&self) -> Option<&str> {
        self.tracer.last()
    }

    /// Identifiers from the last insert.
    ///
    /// Identifiers are strings when `pcs(true)` was set for that insert.
    pub fn last_insert_id(&self) -> Option<&LastInsertedIds> {
        self.last_insert.as_ref()
    }

    // ---- fluent options -------------------------------------------------

    /// Set the filter. Values of the primary-key field are coerced into
    /// identifiers.
    pub fn where_(&mut self, filter: Document) -> &mut Self {
        let filter = self.connection.compiler().compile_where(filter);
        self.options.set_filter(filter);
        self
    }

    /// Select the fields to return.
    pub fn field(&mut self, fields: impl Into<Fields>) -> &mut Self {
        let projection = fields.into().to_projection(&self.connection.config().pk);
        self.options.set_projection(projection);
        self
    }

    /// Set the sort order, e.g. `doc! { "age": -1 }`.
    pub fn sort(&mut self, sort: Document) -> &mut Self {
        self.options.set_sort(sort);
        self
    }

    /// Group rows, e.g. `doc! { "_id": "$city", "n": { "$sum": 1 } }`.
    pub fn group(&mut self, group: Document) -> &mut Self {
        self.options.set_group(group);
        self
    }

    /// Limit the rows returned, or the documents touched by update/delete.
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.options.set_limit(limit);
        self
    }

    /// Skip rows.
    pub fn skip(&mut self, skip: u64) -> &mut Self {
        self.options.set_skip(skip);
        self
    }

    /// Insert when an update matches nothing.
    pub fn upsert(&mut self, upsert: bool) -> &mut Self {
        self.options.set_upsert(upsert);
        self
    }

    /// Return inserted identifiers as strings.
    pub fn pcs(&mut self, enabled: bool) -> &mut Self {
        self.options.set_pk_convert_string(enabled);
        self
    }

    /// Drop one option.
    pub fn remove_option(&mut self, key: OptionKey) -> &mut Self {
        self.options.remove(key);
        self
    }

    /// Drop every option.
    pub fn reset(&mut self) -> &mut Self {
        self.options.reset();
        self
    }

    // ---- writes ---------------------------------------------------------

    /// Insert one document and return the inserted count.
    pub async fn insert(&mut self, document: Document) -> QueryResult<u64> {
        let result = self.run_insert(document).await.map(|(count, _)| count);
        self.options.reset();
        result
    }

    /// Insert one document and return its identifier.
    pub async fn insert_get_id(&mut self, document: Document) -> QueryResult<Bson> {
        let result = self.run_insert(document).await.map(|(_, id)| id);
        self.options.reset();
        result
    }

    /// Insert a batch of documents in one round trip.
    ///
    /// Documents that are empty after normalization are skipped and get no
    /// identifier. Fails when the batch has nothing to insert.
    pub async fn insert_all(&mut self, documents: Vec<Document>) -> QueryResult<InsertManyResult> {
        let result = self.run_insert_all(documents).await;
        self.options.reset();
        result
    }

    /// Update the documents matching `where`.
    ///
    /// Plain values are `$set`; `["$op", operand]` pairs go to `$op`. A limit
    /// of exactly 1 updates a single document, anything else every match.
    /// Returns the matched count.
    pub async fn update(&mut self, update: Document) -> QueryResult<u64> {
        let result = self.run_update(update).await;
        self.options.reset();
        result
    }

    /// Set one field.
    pub async fn set_field(&mut self, field: &str, value: impl Into<Bson>) -> QueryResult<u64> {
        let mut update = Document::new();
        update.insert(field, value.into());
        self.update(update).await
    }

    /// Increment one field by `step`.
    pub async fn set_inc(&mut self, field: &str, step: i64) -> QueryResult<u64> {
        self.update(increment(field, step)).await
    }

    /// Decrement one field by `step`.
    ///
    /// Fails without executing when `step` has no negation (`i64::MIN`).
    pub async fn set_dec(&mut self, field: &str, step: i64) -> QueryResult<u64> {
        let Some(negated) = step.checked_neg() else {
            self.options.reset();
            return Err(QueryError::invalid_value(format!(
                "cannot decrement '{}' by {}",
                field, step
            )));
        };
        self.update(increment(field, negated)).await
    }

    /// Delete the documents matching `where`.
    ///
    /// A limit of exactly 1 deletes a single document. Returns the deleted
    /// count.
    pub async fn delete(&mut self) -> QueryResult<u64> {
        let result = self.run_delete().await;
        self.options.reset();
        result
    }

    // ---- reads ----------------------------------------------------------

    /// Run the aggregation and return every row.
    pub async fn select(&mut self) -> QueryResult<Vec<Document>> {
        let result = self.run_select().await;
        self.options.reset();
        result
    }

    /// Return the first matching row, if any.
    pub async fn find(&mut self) -> QueryResult<Option<Document>> {
        let result = self.run_find().await;
        self.options.reset();
        result
    }

    /// Return one field of the first matching row.
    ///
    /// `None` when the field is missing, the row is missing, or `field` is
    /// not a single field name.
    pub async fn value(&mut self, field: &str) -> QueryResult<Option<Bson>> {
        let result = self.run_value(field).await;
        self.options.reset();
        result
    }

    /// Return one field of every row, or rows keyed by the first of
    /// several comma-separated fields.
    pub async fn column(&mut self, fields: &str) -> QueryResult<Column> {
        let result = self.run_column(fields).await;
        self.options.reset();
        result
    }

    /// Count the matching documents.
    pub async fn count(&mut self) -> QueryResult<u64> {
        let result = self.run_count().await;
        self.options.reset();
        result
    }

    /// Return page `page` (1-based; smaller values mean 1).
    ///
    /// Without a limit, the configured page size is used.
    pub async fn page(&mut self, page: i64) -> QueryResult<Vec<Document>> {
        let result = self.run_page(page).await;
        self.options.reset();
        result
    }

    // ---- compilation and execution --------------------------------------

    fn require_database(&self) -> QueryResult<()> {
        if !self.namespace.has_database() {
            return Err(QueryError::missing_database(self.namespace.to_string()));
        }
        if !self.namespace.has_collection() {
            return Err(QueryError::missing_collection(self.namespace.to_string()));
        }
        Ok(())
    }

    fn new_bulk(&self) -> BulkWrite {
        BulkWrite::new(self.namespace.clone())
            .with_write_concern(self.connection.config().write_concern.clone())
    }

    /// Apply `pcs` to an identifier handed back to the caller.
    fn present_id(&self, id: Bson) -> Bson {
        if self.options.pk_convert_string() {
            Bson::String(self.connection.codec().id_to_string(&id))
        } else {
            id
        }
    }

    async fn execute_write(
        &mut self,
        bulk: &BulkWrite,
        statement: impl FnOnce() -> Statement,
    ) -> QueryResult<WriteResult> {
        debug!(
            namespace = %self.namespace,
            operations = bulk.len(),
            "executing bulk write"
        );
        let result = self.connection.executor().execute_bulk_write(bulk).await?;
        self.tracer.record(&self.namespace, statement);
        Ok(result)
    }

    async fn run_insert(&mut self, document: Document) -> QueryResult<(u64, Bson)> {
        self.require_database()?;
        let document = self.connection.compiler().compile_insert(document)?;

        let mut bulk = self.new_bulk();
        let codec = self.connection.codec();
        let id = bulk.insert(document, || codec.new_id());

        let result = self
            .execute_write(&bulk, || Statement::Insert(bulk.inserted_documents()))
            .await?;

        let id = self.present_id(id);
        self.last_insert = Some(LastInsertedIds::One(id.clone()));
        Ok((result.inserted_count, id))
    }

    async fn run_insert_all(&mut self, documents: Vec<Document>) -> QueryResult<InsertManyResult> {
        self.require_database()?;
        let mut bulk = self.new_bulk();
        let mut ids = Vec::with_capacity(documents.len());
        let codec = self.connection.codec();

        for raw in documents {
            match self.connection.compiler().compile_insert(raw) {
                Ok(document) => ids.push(bulk.insert(document, || codec.new_id())),
                Err(err) if err.is_empty_document() => {
                    debug!(namespace = %self.namespace, "skipping empty document in batch");
                }
                Err(err) => return Err(err),
            }
        }
        if bulk.is_empty() {
            return Err(QueryError::EmptyDocument);
        }

        let result = self
            .execute_write(&bulk, || Statement::Insert(bulk.inserted_documents()))
            .await?;

        let inserted_ids: Vec<Bson> = ids.into_iter().map(|id| self.present_id(id)).collect();
        self.last_insert = Some(LastInsertedIds::Many(inserted_ids.clone()));
        Ok(InsertManyResult {
            inserted_count: result.inserted_count,
            inserted_ids,
        })
    }

    async fn run_update(&mut self, update: Document) -> QueryResult<u64> {
        self.require_database()?;
        let filter = self.options.filter().clone();
        if filter.is_empty() {
            return Err(QueryError::missing_condition("update"));
        }
        let update = self.connection.compiler().compile_update(update)?.into_document();

        let multi = self.options.limit() != Some(1);
        let upsert = self.options.upsert_or(false);

        let mut bulk = self.new_bulk();
        bulk.update(filter.clone(), update.clone(), multi, upsert);

        let result = self
            .execute_write(&bulk, || Statement::Update {
                filter,
                update,
                multi,
                upsert,
            })
            .await?;
        Ok(result.matched_count)
    }

    async fn run_delete(&mut self) -> QueryResult<u64> {
        self.require_database()?;
        let filter = self.options.filter().clone();
        if filter.is_empty() {
            return Err(QueryError::missing_condition("delete"));
        }
        let just_one = self.options.limit() == Some(1);

        let mut bulk = self.new_bulk();
        bulk.delete(filter.clone(), just_one);

        let result = self
            .execute_write(&bulk, || Statement::Remove { filter, just_one })
            .await?;
        Ok(result.deleted_count)
    }

    async fn run_select(&mut self) -> QueryResult<Vec<Document>> {
        self.require_database()?;

        // Only the count stage depends on the server version.
        let version = match self.options.count() {
            Some(_) => self.connection.server_version().await?,
            None => ServerVersion::default(),
        };
        let pipeline = PipelineCompiler::new(version).compile(&self.options);
        debug!(
            namespace = %self.namespace,
            stages = ?pipeline.stage_names(),
            "compiled aggregate"
        );

        let command = AggregateCommand::new(self.namespace.clone(), pipeline);
        let document = command.to_document();
        let rows = self
            .connection
            .executor()
            .execute_command(command.database(), document.clone())
            .await?;
        self.tracer
            .record(&self.namespace, || Statement::RunCommand(document));
        Ok(rows)
    }

    async fn run_find(&mut self) -> QueryResult<Option<Document>> {
        self.options.set_limit(1);
        Ok(self.run_select().await?.into_iter().next())
    }

    async fn run_value(&mut self, field: &str) -> QueryResult<Option<Bson>> {
        let field = field.trim();
        if field.is_empty() || field.contains(',') {
            return Ok(None);
        }
        self.field(field);
        Ok(self
            .run_find()
            .await?
            .and_then(|mut row| row.remove(field)))
    }

    async fn run_column(&mut self, fields: &str) -> QueryResult<Column> {
        let selection = Fields::from(fields);
        let names: Vec<String> = selection.names().into_iter().map(String::from).collect();
        self.field(selection);
        let rows = self.run_select().await?;

        let column = match names.as_slice() {
            [] => Column::Values(Vec::new()),
            [single] => Column::Values(
                rows.into_iter()
                    .filter_map(|mut row| row.remove(single))
                    .collect(),
            ),
            [key_field, ..] => Column::Keyed(
                rows.into_iter()
                    .filter_map(|row| {
                        let key = row.get(key_field).map(key_string)?;
                        Some((key, row))
                    })
                    .collect(),
            ),
        };
        Ok(column)
    }

    async fn run_count(&mut self) -> QueryResult<u64> {
        self.options.set_count(COUNT_LABEL);
        let rows = self.run_select().await?;
        Ok(rows
            .first()
            .and_then(|row| row.get(COUNT_LABEL))
            .map(count_value)
            .unwrap_or(0))
    }

    async fn run_page(&mut self, page: i64) -> QueryResult<Vec<Document>> {
        let page = u64::try_from(page.max(1)).unwrap_or(1);
        if self.options.limit_or(0) == 0 {
            self.options.set_limit(self.connection.config().page_size);
        }
        let limit = self.options.limit_or(0);
        self.options.set_skip((page - 1).saturating_mul(limit));
        self.run_select().await
    }
}

fn increment(field: &str, step: i64) -> Document {
    let mut update = Document::new();
    update.insert(
        field,
        Bson::Array(vec![Bson::String("$inc".to_string()), Bson::Int64(step)]),
    );
    update
}

fn key_string(value: &Bson) -> String {
    match value {
        Bson::String(s) => s.clone(),
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}

fn count_value(value: &Bson) -> u64 {
    match value {
        Bson::Int32(n) => u64::try_from(*n).unwrap_or(0),
        Bson::Int64(n) => u64::try_from(*n).unwrap_or(0),
        Bson::Double(n) if *n > 0.0 => *n as u64,
        _ => 0,
    }
}
