//! Per-statement option accumulator.

use bson::Document;

/// Names of the individual statement options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKey {
    /// Filter document.
    Where,
    /// Projection document.
    Field,
    /// Sort document.
    Sort,
    /// Group document.
    Group,
    /// Maximum number of documents.
    Limit,
    /// Number of documents to skip.
    Skip,
    /// Update-or-insert flag.
    Upsert,
    /// Output label of a count stage.
    Count,
    /// Return inserted identifiers as strings.
    PkConvertString,
}

impl OptionKey {
    /// Every option key.
    pub const ALL: [OptionKey; 9] = [
        OptionKey::Where,
        OptionKey::Field,
        OptionKey::Sort,
        OptionKey::Group,
        OptionKey::Limit,
        OptionKey::Skip,
        OptionKey::Upsert,
        OptionKey::Count,
        OptionKey::PkConvertString,
    ];

    /// The option's name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKey::Where => "where",
            OptionKey::Field => "field",
            OptionKey::Sort => "sort",
            OptionKey::Group => "group",
            OptionKey::Limit => "limit",
            OptionKey::Skip => "skip",
            OptionKey::Upsert => "upsert",
            OptionKey::Count => "count",
            OptionKey::PkConvertString => "pk_convert_string",
        }
    }
}

/// Options accumulated by the fluent chain of one statement.
///
/// Setters overwrite and return `&mut Self`. Nothing is validated here;
/// terminal operations decide what they require. `limit` and `skip` are
/// unsigned so they can never go negative, and `where` holds a canonical
/// (already normalized) document that may be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    filter: Document,
    projection: Option<Document>,
    sort: Option<Document>,
    group: Option<Document>,
    limit: Option<u64>,
    skip: Option<u64>,
    upsert: Option<bool>,
    count: Option<String>,
    pk_convert_string: bool,
}

impl QueryOptions {
    /// Create options at the defaults baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the canonical filter.
    pub fn set_filter(&mut self, filter: Document) -> &mut Self {
        self.filter = filter;
        self
    }

    /// Set the projection. An empty document clears it.
    pub fn set_projection(&mut self, projection: Document) -> &mut Self {
        self.projection = (!projection.is_empty()).then_some(projection);
        self
    }

    /// Set the sort document. An empty document clears it.
    pub fn set_sort(&mut self, sort: Document) -> &mut Self {
        self.sort = (!sort.is_empty()).then_some(sort);
        self
    }

    /// Set the group document. An empty document clears it.
    pub fn set_group(&mut self, group: Document) -> &mut Self {
        self.group = (!group.is_empty()).then_some(group);
        self
    }

    /// Set the limit.
    pub fn set_limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// Set the skip.
    pub fn set_skip(&mut self, skip: u64) -> &mut Self {
        self.skip = Some(skip);
        self
    }

    /// Set the upsert flag.
    pub fn set_upsert(&mut self, upsert: bool) -> &mut Self {
        self.upsert = Some(upsert);
        self
    }

    /// Mark the statement as a count with the given output label.
    pub fn set_count(&mut self, label: impl Into<String>) -> &mut Self {
        self.count = Some(label.into());
        self
    }

    /// Set whether inserted identifiers are returned as strings.
    pub fn set_pk_convert_string(&mut self, enabled: bool) -> &mut Self {
        self.pk_convert_string = enabled;
        self
    }

    /// The canonical filter (possibly empty).
    pub fn filter(&self) -> &Document {
        &self.filter
    }

    /// The projection, if any.
    pub fn projection(&self) -> Option<&Document> {
        self.projection.as_ref()
    }

    /// The sort document, if any.
    pub fn sort(&self) -> Option<&Document> {
        self.sort.as_ref()
    }

    /// The group document, if any.
    pub fn group(&self) -> Option<&Document> {
        self.group.as_ref()
    }

    /// The limit, if set.
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// The limit, or `default` when unset.
    pub fn limit_or(&self, default: u64) -> u64 {
        self.limit.unwrap_or(default)
    }

    /// The skip, or `default` when unset.
    pub fn skip_or(&self, default: u64) -> u64 {
        self.skip.unwrap_or(default)
    }

    /// The upsert flag, or `default` when unset.
    pub fn upsert_or(&self, default: bool) -> bool {
        self.upsert.unwrap_or(default)
    }

    /// The count label, if the statement is a count.
    pub fn count(&self) -> Option<&str> {
        self.count.as_deref()
    }

    /// Whether inserted identifiers are returned as strings.
    pub fn pk_convert_string(&self) -> bool {
        self.pk_convert_string
    }

    /// Whether the option is currently set.
    pub fn contains(&self, key: OptionKey) -> bool {
        match key {
            OptionKey::Where => !self.filter.is_empty(),
            OptionKey::Field => self.projection.is_some(),
            OptionKey::Sort => self.sort.is_some(),
            OptionKey::Group => self.group.is_some(),
            OptionKey::Limit => self.limit.is_some(),
            OptionKey::Skip => self.skip.is_some(),
            OptionKey::Upsert => self.upsert.is_some(),
            OptionKey::Count => self.count.is_some(),
            OptionKey::PkConvertString => self.pk_convert_string,
        }
    }

    /// Remove a single option.
    pub fn remove(&mut self, key: OptionKey) -> &mut Self {
        match key {
            OptionKey::Where => self.filter = Document::new(),
            OptionKey::Field => self.projection = None,
            OptionKey::Sort => self.sort = None,
            OptionKey::Group => self.group = None,
            OptionKey::Limit => self.limit = None,
            OptionKey::Skip => self.skip = None,
            OptionKey::Upsert => self.upsert = None,
            OptionKey::Count => self.count = None,
            OptionKey::PkConvertString => self.pk_convert_string = false,
        }
        self
    }

    /// Reset every option to the defaults baseline.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }
}
