//! Compilation of caller documents into canonical driver documents.

use bson::{Bson, Document};
use indexmap::IndexMap;

use crate::error::{QueryError, QueryResult};
use crate::value::ValueNormalizer;

/// Update operators mapped to their field sub-documents, e.g.
/// `{ "$set": { "name": "Ann" }, "$inc": { "age": 1 } }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateDocument {
    operators: IndexMap<String, Document>,
}

impl UpdateDocument {
    /// Route a normalized operand into an operator's sub-document.
    pub fn push(&mut self, operator: impl Into<String>, field: impl Into<String>, operand: Bson) {
        self.operators
            .entry(operator.into())
            .or_default()
            .insert(field.into(), operand);
    }

    /// Operator names in first-use order.
    pub fn operators(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }

    /// Whether no operator was produced.
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Convert into a driver document.
    pub fn into_document(self) -> Document {
        self.operators
            .into_iter()
            .map(|(operator, fields)| (operator, Bson::Document(fields)))
            .collect()
    }
}

/// Turns insert payloads, `where` maps and update maps into canonical
/// documents. Field names are trimmed; values go through
/// [`ValueNormalizer`].
#[derive(Debug, Clone, Default)]
pub struct DocumentCompiler {
    normalizer: ValueNormalizer,
}

impl DocumentCompiler {
    /// Create a compiler over a value normalizer.
    pub fn new(normalizer: ValueNormalizer) -> Self {
        Self { normalizer }
    }

    /// Compile an insert payload. Fails on an empty document.
    pub fn compile_insert(&self, raw: Document) -> QueryResult<Document> {
        let document = self.normalize_fields(raw);
        if document.is_empty() {
            return Err(QueryError::EmptyDocument);
        }
        Ok(document)
    }

    /// Compile a filter. An empty input yields an empty filter.
    pub fn compile_where(&self, raw: Document) -> Document {
        self.normalize_fields(raw)
    }

    /// Compile an update map into operator form. Fails when nothing remains.
    pub fn compile_update(&self, raw: Document) -> QueryResult<UpdateDocument> {
        let mut update = UpdateDocument::default();
        for (key, value) in raw {
            let field = key.trim();
            let (operator, operand) = self.normalizer.normalize_update_entry(field, value);
            update.push(operator, field, operand);
        }
        if update.is_empty() {
            return Err(QueryError::EmptyUpdate);
        }
        Ok(update)
    }

    fn normalize_fields(&self, raw: Document) -> Document {
        raw.into_iter()
            .map(|(key, value)| {
                let field = key.trim().to_string();
                let value = self.normalizer.normalize(value, &field);
                (field, value)
            })
            .collect()
    }
}
