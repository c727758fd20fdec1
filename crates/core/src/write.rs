// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-set vocabulary consumed by destination commits
//!
//! A write-set is one source transaction rendered in destination terms: a
//! sequence of asserts/retracts followed by exactly one checkpoint update.
//! The destination applies the whole set atomically or not at all.

use crate::attr::AttributeMetadata;
use crate::fact::{EntityId, Partition};
use crate::identity::EntityIdentity;
use crate::tx::TxId;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Destination-usable reference to an entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestRef {
    /// Entity already present in the destination
    Existing(EntityId),
    /// Entity not yet present; the destination allocates a concrete id in
    /// the same partition at commit time. Tempids are negative and unique
    /// within one write-set.
    Provisional { part: Partition, tempid: i64 },
}

impl fmt::Display for DestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestRef::Existing(e) => write!(f, "{}", e),
            DestRef::Provisional { part, tempid } => write!(f, "{}{}", part, tempid),
        }
    }
}

/// Translated fact value: a scalar copied as-is, or a rewritten reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WriteValue {
    Scalar(Value),
    Ref(DestRef),
}

/// One operation within a write-set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WriteOp {
    /// Assert an attribute value on an entity. Carries the entity's identity
    /// pair so a brand-new destination entity is resolvable on subsequent
    /// transactions.
    Assert {
        entity: DestRef,
        identity: EntityIdentity,
        attribute: String,
        value: WriteValue,
    },
    /// Retract an attribute value, keyed by the entity's identity
    Retract {
        identity: EntityIdentity,
        attribute: String,
        value: WriteValue,
    },
    /// Advance the replication checkpoint to `t`
    Checkpoint { t: TxId },
}

/// Ordered, atomically-applied set of operations for one source transaction
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WriteSet {
    pub ops: Vec<WriteOp>,
}

impl WriteSet {
    pub fn new(ops: Vec<WriteOp>) -> Self {
        Self { ops }
    }

    /// The checkpoint position this write-set advances to, if any
    pub fn checkpoint(&self) -> Option<TxId> {
        self.ops.iter().rev().find_map(|op| match op {
            WriteOp::Checkpoint { t } => Some(*t),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Schema-level fact ensured during destination bootstrap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SchemaFact {
    /// An attribute definition, created if no attribute with that ident exists
    Attribute(AttributeMetadata),
    /// A named record, created if nothing answers to the identity
    Record(EntityIdentity),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_reads_the_trailing_op() {
        let set = WriteSet::new(vec![WriteOp::Checkpoint { t: TxId(7) }]);
        assert_eq!(set.checkpoint(), Some(TxId(7)));
    }

    #[test]
    fn checkpoint_is_none_without_one() {
        assert_eq!(WriteSet::default().checkpoint(), None);
    }

    #[test]
    fn provisional_refs_compare_by_partition_and_tempid() {
        let a = DestRef::Provisional {
            part: Partition::USER,
            tempid: -1,
        };
        let b = DestRef::Provisional {
            part: Partition::USER,
            tempid: -1,
        };
        let c = DestRef::Provisional {
            part: Partition::USER,
            tempid: -2,
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
