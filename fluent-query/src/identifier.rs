//! Opaque primary-key identifiers.
//!
//! The query layer never looks inside an identifier. It only needs to build
//! one from a string, mint a fresh one, and turn one back into a string.
//! [`ObjectIdCodec`] provides that for BSON `ObjectId`s.

use std::fmt;
use std::sync::Arc;

use bson::Bson;
use bson::oid::ObjectId;
use tracing::warn;

use crate::error::QueryResult;

/// Constructs and stringifies opaque identifiers.
pub trait IdentifierCodec: Send + Sync {
    /// Build an identifier from its string form.
    fn from_string(&self, s: &str) -> QueryResult<Bson>;

    /// Mint a new, unique identifier.
    fn new_id(&self) -> Bson;

    /// Convert an identifier back into its string form.
    fn id_to_string(&self, id: &Bson) -> String;
}

/// Codec for BSON `ObjectId` primary keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectIdCodec;

impl IdentifierCodec for ObjectIdCodec {
    fn from_string(&self, s: &str) -> QueryResult<Bson> {
        Ok(Bson::ObjectId(ObjectId::parse_str(s)?))
    }

    fn new_id(&self) -> Bson {
        Bson::ObjectId(ObjectId::new())
    }

    fn id_to_string(&self, id: &Bson) -> String {
        match id {
            Bson::ObjectId(oid) => oid.to_hex(),
            Bson::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Coercion policy for string values of the primary-key field.
///
/// A well-formed identifier string becomes the identifier it names. A
/// malformed one does not fail the statement: it is replaced by a freshly
/// minted identifier and a warning is logged. Callers relying on `_id`
/// lookups with user-supplied strings should be aware that a typo therefore
/// matches nothing rather than erroring.
#[derive(Clone)]
pub struct LenientIdentifierCoercion {
    codec: Arc<dyn IdentifierCodec>,
}

impl LenientIdentifierCoercion {
    /// Create the policy over a codec.
    pub fn new(codec: Arc<dyn IdentifierCodec>) -> Self {
        Self { codec }
    }

    /// Coerce a raw string into an identifier, never failing.
    pub fn coerce(&self, field: &str, raw: &str) -> Bson {
        match self.codec.from_string(raw) {
            Ok(id) => id,
            Err(err) => {
                warn!(
                    field = %field,
                    value = %raw,
                    error = %err,
                    "malformed identifier replaced with a generated one"
                );
                self.codec.new_id()
            }
        }
    }
}

impl Default for LenientIdentifierCoercion {
    fn default() -> Self {
        Self::new(Arc::new(ObjectIdCodec))
    }
}

impl fmt::Debug for LenientIdentifierCoercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LenientIdentifierCoercion").finish()
    }
}
