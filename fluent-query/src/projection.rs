//! Field selection for `$project`.

use bson::Document;

/// Value marking a projected field as shown.
pub const FIELD_SHOW: i32 = 1;
/// Value marking a projected field as hidden.
pub const FIELD_HIDDEN: i32 = 0;

/// Fields selected by `field(..)`.
///
/// Either a list of names (`"name,age"`, `vec!["name", "age"]`) or a full
/// projection document whose values are kept verbatim, which allows
/// computed fields such as `{ "next": { "$add": ["$id", 1] } }`.
#[derive(Debug, Clone, PartialEq)]
pub enum Fields {
    /// Plain field names to include.
    Names(Vec<String>),
    /// A projection document.
    Document(Document),
}

impl Fields {
    /// Whether nothing was selected.
    pub fn is_empty(&self) -> bool {
        match self {
            Fields::Names(names) => names.is_empty(),
            Fields::Document(doc) => doc.is_empty(),
        }
    }

    /// The selected field names, in order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Fields::Names(names) => names.iter().map(String::as_str).collect(),
            Fields::Document(doc) => doc.keys().map(String::as_str).collect(),
        }
    }

    /// Build the `$project` document.
    ///
    /// The primary key is hidden unless the selection names it. An empty
    /// selection yields an empty document, meaning "no projection".
    pub fn to_projection(&self, pk: &str) -> Document {
        if self.is_empty() {
            return Document::new();
        }
        let mut projection = Document::new();
        projection.insert(pk, FIELD_HIDDEN);
        match self {
            Fields::Names(names) => {
                for name in names {
                    projection.insert(name.as_str(), FIELD_SHOW);
                }
            }
            Fields::Document(doc) => {
                for (key, value) in doc {
                    projection.insert(key.as_str(), value.clone());
                }
            }
        }
        projection
    }
}

fn split_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    names
        .into_iter()
        .flat_map(|name| name.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

impl From<&str> for Fields {
    fn from(names: &str) -> Self {
        Fields::Names(split_names([names]))
    }
}

impl From<String> for Fields {
    fn from(names: String) -> Self {
        Fields::from(names.as_str())
    }
}

impl From<&String> for Fields {
    fn from(names: &String) -> Self {
        Fields::from(names.as_str())
    }
}

impl From<Vec<&str>> for Fields {
    fn from(names: Vec<&str>) -> Self {
        Fields::Names(split_names(names))
    }
}

impl From<&[&str]> for Fields {
    fn from(names: &[&str]) -> Self {
        Fields::Names(split_names(names.iter().copied()))
    }
}

impl From<Vec<String>> for Fields {
    fn from(names: Vec<String>) -> Self {
        Fields::Names(split_names(names.iter().map(String::as_str)))
    }
}

impl From<Document> for Fields {
    fn from(doc: Document) -> Self {
        Fields::Document(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_comma_list() {
        let fields = Fields::from("name, age,,");
        assert_eq!(fields.names(), vec!["name", "age"]);
        assert_eq!(
            fields.to_projection("_id"),
            doc! { "_id": 0, "name": 1, "age": 1 }
        );
    }

    #[test]
    fn test_explicit_pk_is_shown() {
        let fields = Fields::from(vec!["_id", "name"]);
        assert_eq!(fields.to_projection("_id"), doc! { "_id": 1, "name": 1 });
    }

    #[test]
    fn test_computed_fields_are_verbatim() {
        let fields = Fields::from(doc! { "id": 1, "id1": { "$add": ["$id", 1] } });
        assert_eq!(
            fields.to_projection("_id"),
            doc! { "_id": 0, "id": 1, "id1": { "$add": ["$id", 1] } }
        );
    }

    #[test]
    fn test_empty_selection_has_no_projection() {
        assert!(Fields::from("").to_projection("_id").is_empty());
        assert!(Fields::from(Document::new()).to_projection("_id").is_empty());
    }
}
