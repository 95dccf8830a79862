//! Bulk write requests handed to the executor.

use bson::{Bson, Document};

use crate::config::WriteConcern;
use crate::namespace::Namespace;

/// A single operation inside a bulk write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteModel {
    /// Insert one document.
    Insert {
        /// The canonical document, `_id` included.
        document: Document,
    },
    /// Update matching documents.
    Update {
        /// Canonical filter.
        filter: Document,
        /// Operator update document.
        update: Document,
        /// Update every match rather than the first.
        multi: bool,
        /// Insert when nothing matches.
        upsert: bool,
    },
    /// Delete matching documents.
    Delete {
        /// Canonical filter.
        filter: Document,
        /// Delete only the first match.
        just_one: bool,
    },
}

/// A batch of write operations sent in one round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkWrite {
    namespace: Namespace,
    operations: Vec<WriteModel>,
    write_concern: Option<WriteConcern>,
}

impl BulkWrite {
    /// Create an empty bulk write against a namespace.
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            operations: Vec::new(),
            write_concern: None,
        }
    }

    /// Attach a write concern.
    pub fn with_write_concern(mut self, write_concern: Option<WriteConcern>) -> Self {
        self.write_concern = write_concern;
        self
    }

    /// Queue an insert and return the document's `_id`.
    ///
    /// A document without `_id` gets `generated` placed first, the way the
    /// driver assigns ids on insert.
    pub fn insert(&mut self, mut document: Document, generated: impl FnOnce() -> Bson) -> Bson {
        let id = match document.get("_id").cloned() {
            Some(id) => id,
            None => {
                let id = generated();
                let mut with_id = Document::new();
                with_id.insert("_id", id.clone());
                with_id.extend(document);
                document = with_id;
                id
            }
        };
        self.operations.push(WriteModel::Insert { document });
        id
    }

    /// Queue an update.
    pub fn update(&mut self, filter: Document, update: Document, multi: bool, upsert: bool) {
        self.operations.push(WriteModel::Update {
            filter,
            update,
            multi,
            upsert,
        });
    }

    /// Queue a delete.
    pub fn delete(&mut self, filter: Document, just_one: bool) {
        self.operations
            .push(WriteModel::Delete { filter, just_one });
    }

    /// The target namespace.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// The queued operations in order.
    pub fn operations(&self) -> &[WriteModel] {
        &self.operations
    }

    /// The write concern, if any.
    pub fn write_concern(&self) -> Option<&WriteConcern> {
        self.write_concern.as_ref()
    }

    /// Documents of the queued inserts, in order.
    pub fn inserted_documents(&self) -> Vec<Document> {
        self.operations
            .iter()
            .filter_map(|op| match op {
                WriteModel::Insert { document } => Some(document.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of queued operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Counters reported for an executed bulk write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteResult {
    /// Documents inserted.
    pub inserted_count: u64,
    /// Documents matched by updates.
    pub matched_count: u64,
    /// Documents modified by updates.
    pub modified_count: u64,
    /// Documents inserted by upserts.
    pub upserted_count: u64,
    /// Documents deleted.
    pub deleted_count: u64,
}

impl WriteResult {
    /// Accumulate another result into this one.
    pub fn merge(&mut self, other: WriteResult) {
        self.inserted_count += other.inserted_count;
        self.matched_count += other.matched_count;
        self.modified_count += other.modified_count;
        self.upserted_count += other.upserted_count;
        self.deleted_count += other.deleted_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use bson::oid::ObjectId;

    #[test]
    fn test_insert_assigns_id_first() {
        let mut bulk = BulkWrite::new(Namespace::new("app", "users"));
        let oid = ObjectId::new();
        let id = bulk.insert(doc! { "name": "Ann" }, || Bson::ObjectId(oid));
        assert_eq!(id, Bson::ObjectId(oid));

        match &bulk.operations()[0] {
            WriteModel::Insert { document } => {
                assert_eq!(document.keys().next().map(String::as_str), Some("_id"));
                assert_eq!(document.get_str("name").unwrap(), "Ann");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_insert_keeps_existing_id() {
        let mut bulk = BulkWrite::new(Namespace::new("app", "users"));
        let id = bulk.insert(doc! { "_id": 7, "name": "Ann" }, || panic!("not generated"));
        assert_eq!(id, Bson::Int32(7));
    }

    #[test]
    fn test_merge_results() {
        let mut total = WriteResult {
            inserted_count: 2,
            ..Default::default()
        };
        total.merge(WriteResult {
            matched_count: 3,
            deleted_count: 1,
            ..Default::default()
        });
        assert_eq!(total.inserted_count, 2);
        assert_eq!(total.matched_count, 3);
        assert_eq!(total.deleted_count, 1);
    }
}
