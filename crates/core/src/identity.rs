// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stable entity identities (lookup-refs)
//!
//! An identity names an entity independently of either database's internal
//! id, so the same entity is findable on both sides even after the two
//! databases diverge in their identifier spaces.

use crate::fact::EntityId;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ident of the source database's unique-name attribute
pub const DB_IDENT: &str = ":db/ident";

/// Synthetic identifying attribute recording the original source entity id
/// on the destination-side entity. Created by bootstrap; unique, scalar.
pub const SOURCE_EID: &str = ":ripple/source-eid";

/// Checkpoint attribute on the replication metadata record
pub const SOURCE_T: &str = ":ripple/source-t";

/// Well-known name of the replication metadata record
pub const METADATA_NAME: &str = ":ripple/metadata";

/// Identifying attribute/value pair naming one entity across databases
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityIdentity {
    /// Ident of an identifying (unique) attribute
    pub attribute: String,
    /// The identifying value
    pub value: Value,
}

impl EntityIdentity {
    pub fn new(attribute: impl Into<String>, value: Value) -> Self {
        Self {
            attribute: attribute.into(),
            value,
        }
    }
}

impl fmt::Display for EntityIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}]", self.attribute, self.value)
    }
}

/// Fallback identity for an entity with no unique name: the mirrored
/// source-side id itself.
pub fn source_eid_identity(e: EntityId) -> EntityIdentity {
    EntityIdentity::new(SOURCE_EID, Value::I64(e.0))
}

/// Identity of the replication metadata record in the destination
pub fn metadata_identity() -> EntityIdentity {
    EntityIdentity::new(DB_IDENT, Value::Keyword(METADATA_NAME.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact::Partition;

    #[test]
    fn source_eid_identity_embeds_the_raw_id() {
        let e = EntityId::new(Partition::USER, 5);
        let identity = source_eid_identity(e);
        assert_eq!(identity.attribute, SOURCE_EID);
        assert_eq!(identity.value, Value::I64(e.0));
    }

    #[test]
    fn metadata_identity_is_stable() {
        assert_eq!(metadata_identity(), metadata_identity());
    }

    #[test]
    fn identities_with_same_pair_are_equal() {
        let a = EntityIdentity::new(DB_IDENT, Value::keyword(":dept/eng"));
        let b = EntityIdentity::new(DB_IDENT, Value::keyword(":dept/eng"));
        assert_eq!(a, b);
    }
}
