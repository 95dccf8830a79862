//! Database commands handed to the executor.

use bson::{Bson, Document, doc};

use crate::namespace::Namespace;
use crate::pipeline::Pipeline;

/// An `aggregate` command over one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateCommand {
    namespace: Namespace,
    pipeline: Pipeline,
}

impl AggregateCommand {
    /// Create an aggregate command.
    pub fn new(namespace: Namespace, pipeline: Pipeline) -> Self {
        Self {
            namespace,
            pipeline,
        }
    }

    /// The database the command runs against.
    pub fn database(&self) -> &str {
        self.namespace.database()
    }

    /// Render the command document.
    pub fn to_document(&self) -> Document {
        let stages: Vec<Bson> = self
            .pipeline
            .to_documents()
            .into_iter()
            .map(Bson::Document)
            .collect();
        doc! {
            "aggregate": self.namespace.collection(),
            "pipeline": stages,
            "cursor": {},
        }
    }
}
