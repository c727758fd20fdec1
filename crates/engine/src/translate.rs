// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-transaction fact translation
//!
//! Converts one source transaction into a destination-applicable write-set.
//! A translator is constructed fresh for each transaction and discarded
//! afterwards: its entity-id memo is only valid while that transaction is
//! being processed, because provisional ids allocated for new entities must
//! be reused consistently within the transaction and never beyond it.

use crate::error::ReplicationError;
use crate::resolver::{IdentityPolicy, IdentityResolver};
use ripple_core::{
    DestRef, EntityId, EntityIdentity, Fact, Transaction, Value, ValueType, WriteOp, WriteSet,
    WriteValue,
};
use ripple_store::{DestStore, SourceView};
use std::collections::{HashMap, HashSet};

/// Translates one transaction's facts into destination terms
pub struct TxTranslator<'a, V, D> {
    resolver: IdentityResolver<'a, V>,
    view: &'a V,
    dest: &'a D,
    ids: HashMap<EntityId, DestRef>,
    /// Provisional entities in creation order, with their identities
    provisional: Vec<(EntityId, EntityIdentity)>,
    /// Entities whose identity is already carried by an assert in this set
    bound: HashSet<EntityId>,
    next_tempid: i64,
}

impl<'a, V, D> TxTranslator<'a, V, D>
where
    V: SourceView,
    D: DestStore,
{
    pub fn new(view: &'a V, dest: &'a D, policy: &'a dyn IdentityPolicy) -> Self {
        Self {
            resolver: IdentityResolver::new(view, policy),
            view,
            dest,
            ids: HashMap::new(),
            provisional: Vec::new(),
            bound: HashSet::new(),
            next_tempid: 0,
        }
    }

    /// Render the whole transaction as an atomic write-set: one operation
    /// per fact, in source order, then identity bindings for new entities
    /// that were only referenced, closed by the checkpoint update.
    pub async fn translate(mut self, tx: &Transaction) -> Result<WriteSet, ReplicationError> {
        let mut ops = Vec::with_capacity(tx.facts.len() + 1);
        for fact in &tx.facts {
            ops.push(self.translate_fact(fact).await?);
        }

        // A new entity that only appears as a reference value still needs
        // its identity asserted, or nothing could resolve it afterwards and
        // a later reference would split it into a second entity.
        for (e, identity) in &self.provisional {
            if self.bound.contains(e) {
                continue;
            }
            let Some(entity) = self.ids.get(e) else {
                continue;
            };
            ops.push(WriteOp::Assert {
                entity: entity.clone(),
                identity: identity.clone(),
                attribute: identity.attribute.clone(),
                value: WriteValue::Scalar(identity.value.clone()),
            });
        }

        ops.push(WriteOp::Checkpoint { t: tx.t });
        Ok(WriteSet::new(ops))
    }

    async fn translate_fact(&mut self, fact: &Fact) -> Result<WriteOp, ReplicationError> {
        let identity = self.resolver.resolve(fact.e).await?;
        let meta = self
            .view
            .attribute(fact.a)
            .await?
            .ok_or(ReplicationError::UnknownAttribute(fact.a))?;

        let value = match meta.value_type {
            ValueType::Ref => match &fact.v {
                Value::Ref(target) => WriteValue::Ref(self.entity_ref(*target).await?),
                _ => {
                    return Err(ReplicationError::ExpectedRef {
                        attribute: meta.ident,
                    })
                }
            },
            ValueType::Scalar => WriteValue::Scalar(fact.v.clone()),
        };

        Ok(if fact.added {
            let entity = self.entity_ref(fact.e).await?;
            self.bound.insert(fact.e);
            WriteOp::Assert {
                entity,
                identity,
                attribute: meta.ident,
                value,
            }
        } else {
            WriteOp::Retract {
                identity,
                attribute: meta.ident,
                value,
            }
        })
    }

    /// Destination-usable reference for a source entity: its concrete
    /// destination id when one answers to its identity, otherwise a
    /// provisional id tagged with the source id's partition. Memoized so a
    /// new entity referenced by several facts lands on one destination
    /// entity.
    pub async fn entity_ref(&mut self, e: EntityId) -> Result<DestRef, ReplicationError> {
        if let Some(dest_ref) = self.ids.get(&e) {
            return Ok(dest_ref.clone());
        }
        let identity = self.resolver.resolve(e).await?;
        let dest_ref = match self.dest.lookup(&identity).await? {
            Some(id) => DestRef::Existing(id),
            None => {
                self.next_tempid -= 1;
                self.provisional.push((e, identity));
                DestRef::Provisional {
                    part: e.partition(),
                    tempid: self.next_tempid,
                }
            }
        };
        self.ids.insert(e, dest_ref.clone());
        Ok(dest_ref)
    }
}

#[cfg(test)]
#[path = "translate_tests.rs"]
mod tests;
