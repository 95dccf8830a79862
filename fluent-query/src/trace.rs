//! Shell-style rendering of the last executed statement.
//!
//! Statements render as `db.<collection>.<verb>(<json args>);`, e.g.
//!
//! ```text
//! db.users.update({"name":"Ann"},{"$inc":{"age":1}},{"multi":false,"upsert":false});
//! ```

use bson::{Bson, Document, doc};
use tracing::debug;

use crate::namespace::Namespace;

/// A compiled statement, as recorded for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// One or more inserted documents.
    Insert(Vec<Document>),
    /// A delete.
    Remove {
        /// Filter.
        filter: Document,
        /// Only the first match.
        just_one: bool,
    },
    /// An update.
    Update {
        /// Filter.
        filter: Document,
        /// Operator update document.
        update: Document,
        /// Every match.
        multi: bool,
        /// Insert when nothing matches.
        upsert: bool,
    },
    /// A database command.
    RunCommand(Document),
}

impl Statement {
    /// The shell verb.
    pub fn verb(&self) -> &'static str {
        match self {
            Statement::Insert(_) => "insert",
            Statement::Remove { .. } => "remove",
            Statement::Update { .. } => "update",
            Statement::RunCommand(_) => "runCommand",
        }
    }

    /// Render against a namespace.
    pub fn render(&self, namespace: &Namespace) -> String {
        let args = match self {
            Statement::Insert(documents) => match documents.as_slice() {
                [single] => to_json(Bson::Document(single.clone())),
                many => to_json(Bson::Array(
                    many.iter().cloned().map(Bson::Document).collect(),
                )),
            },
            Statement::Remove { filter, just_one } => format!(
                "{},{}",
                to_json(Bson::Document(filter.clone())),
                to_json(Bson::Document(doc! { "justOne": *just_one })),
            ),
            Statement::Update {
                filter,
                update,
                multi,
                upsert,
            } => format!(
                "{},{},{}",
                to_json(Bson::Document(filter.clone())),
                to_json(Bson::Document(update.clone())),
                to_json(Bson::Document(doc! { "multi": *multi, "upsert": *upsert })),
            ),
            Statement::RunCommand(command) => to_json(Bson::Document(command.clone())),
        };
        format!("db.{}.{}({});", namespace.collection(), self.verb(), args)
    }
}

fn to_json(value: Bson) -> String {
    value.into_relaxed_extjson().to_string()
}

/// Keeps the rendering of the most recent statement.
///
/// Disabled tracers record nothing and never build statements.
#[derive(Debug, Clone, Default)]
pub struct StatementTracer {
    enabled: bool,
    last: Option<String>,
}

impl StatementTracer {
    /// Create a tracer.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last: None,
        }
    }

    /// Record a statement, replacing the previous one.
    pub fn record(&mut self, namespace: &Namespace, statement: impl FnOnce() -> Statement) {
        if !self.enabled {
            return;
        }
        let rendered = statement().render(namespace);
        debug!(namespace = %namespace, statement = %rendered, "statement executed");
        self.last = Some(rendered);
    }

    /// The last recorded statement.
    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Namespace {
        Namespace::new("app", "users")
    }

    #[test]
    fn test_render_update() {
        let statement = Statement::Update {
            filter: doc! { "name": "Ann" },
            update: doc! { "$inc": { "age": 1 } },
            multi: false,
            upsert: false,
        };
        assert_eq!(
            statement.render(&users()),
            r#"db.users.update({"name":"Ann"},{"$inc":{"age":1}},{"multi":false,"upsert":false});"#
        );
    }

    #[test]
    fn test_render_remove() {
        let statement = Statement::Remove {
            filter: doc! { "age": { "$lt": 18 } },
            just_one: true,
        };
        assert_eq!(
            statement.render(&users()),
            r#"db.users.remove({"age":{"$lt":18}},{"justOne":true});"#
        );
    }

    #[test]
    fn test_render_inserts() {
        let one = Statement::Insert(vec![doc! { "a": 1 }]);
        assert_eq!(one.render(&users()), r#"db.users.insert({"a":1});"#);

        let many = Statement::Insert(vec![doc! { "a": 1 }, doc! { "a": 2 }]);
        assert_eq!(many.render(&users()), r#"db.users.insert([{"a":1},{"a":2}]);"#);
    }

    #[test]
    fn test_render_command() {
        let statement = Statement::RunCommand(doc! { "aggregate": "users", "cursor": {} });
        assert_eq!(
            statement.render(&users()),
            r#"db.users.runCommand({"aggregate":"users","cursor":{}});"#
        );
    }

    #[test]
    fn test_tracer_overwrites() {
        let mut tracer = StatementTracer::new(true);
        tracer.record(&users(), || Statement::Insert(vec![doc! { "a": 1 }]));
        tracer.record(&users(), || Statement::RunCommand(doc! { "ping": 1 }));
        assert_eq!(tracer.last(), Some(r#"db.users.runCommand({"ping":1});"#));
    }

    #[test]
    fn test_disabled_tracer_records_nothing() {
        let mut tracer = StatementTracer::new(false);
        tracer.record(&users(), || panic!("statement built while disabled"));
        assert_eq!(tracer.last(), None);
    }
}
