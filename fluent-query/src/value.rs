//! Canonicalization of single field values.

use bson::Bson;

use crate::identifier::LenientIdentifierCoercion;

/// The operator a plain update value is routed to.
pub const DEFAULT_UPDATE_OPERATOR: &str = "$set";

/// One entry of a caller-supplied update map, after shape disambiguation.
///
/// `{age: ["$inc", 1]}` is an [`UpdateEntry::Operator`]; anything else,
/// including arrays that do not start with an operator name, is a plain
/// value destined for `$set`.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEntry {
    /// `[operator, operand]` pair.
    Operator {
        /// Operator name, e.g. `$inc`.
        operator: String,
        /// Operand applied to the field.
        operand: Bson,
    },
    /// Plain value, implicitly `$set`.
    Set(Bson),
}

impl UpdateEntry {
    /// Classify a raw update value.
    pub fn parse(value: Bson) -> Self {
        match value {
            Bson::Array(items) => match <[Bson; 2]>::try_from(items) {
                Ok([Bson::String(operator), operand]) if operator.starts_with('$') => {
                    UpdateEntry::Operator { operator, operand }
                }
                Ok(pair) => UpdateEntry::Set(Bson::Array(Vec::from(pair))),
                Err(items) => UpdateEntry::Set(Bson::Array(items)),
            },
            other => UpdateEntry::Set(other),
        }
    }

    /// Split into `(operator, operand)`.
    pub fn into_parts(self) -> (String, Bson) {
        match self {
            UpdateEntry::Operator { operator, operand } => (operator, operand),
            UpdateEntry::Set(value) => (DEFAULT_UPDATE_OPERATOR.to_string(), value),
        }
    }
}

/// Canonicalizes field values before they reach the executor.
///
/// Only the primary-key field is touched: a string value there is coerced
/// into an identifier under [`LenientIdentifierCoercion`]. Every other
/// value passes through unchanged.
#[derive(Debug, Clone)]
pub struct ValueNormalizer {
    pk: String,
    coercion: LenientIdentifierCoercion,
}

impl ValueNormalizer {
    /// Create a normalizer for the given primary-key field.
    pub fn new(pk: impl Into<String>, coercion: LenientIdentifierCoercion) -> Self {
        Self {
            pk: pk.into(),
            coercion,
        }
    }

    /// Normalize a value stored under `field`.
    pub fn normalize(&self, value: Bson, field: &str) -> Bson {
        match value {
            Bson::String(raw) if field == self.pk => self.coercion.coerce(field, &raw),
            other => other,
        }
    }

    /// Resolve an update entry into `(operator, normalized operand)`.
    pub fn normalize_update_entry(&self, field: &str, value: Bson) -> (String, Bson) {
        let (operator, operand) = UpdateEntry::parse(value).into_parts();
        (operator, self.normalize(operand, field))
    }
}

impl Default for ValueNormalizer {
    fn default() -> Self {
        Self::new("_id", LenientIdentifierCoercion::default())
    }
}
