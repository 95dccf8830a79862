//! `database.collection` namespaces.

use std::fmt;

/// A fully qualified collection name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    database: String,
    collection: String,
}

impl Namespace {
    /// Create a namespace from its parts.
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// Resolve a collection name against defaults.
    ///
    /// `"users"` becomes `<database>.<prefix>users`. A dotted name such as
    /// `"archive.users"` names its database explicitly and is taken as is,
    /// without the prefix.
    pub fn resolve(name: &str, database: &str, prefix: &str) -> Self {
        match name.split_once('.') {
            Some((database, collection)) => Self::new(database, collection),
            None => Self::new(database, format!("{}{}", prefix, name)),
        }
    }

    /// The database name (may be empty when unresolved).
    pub fn database(&self) -> &str {
        &self.database
    }

    /// The collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Whether a database name was resolved.
    pub fn has_database(&self) -> bool {
        !self.database.is_empty()
    }

    /// Whether a collection name was resolved. `"app."` leaves it empty.
    pub fn has_collection(&self) -> bool {
        !self.collection.is_empty()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}
