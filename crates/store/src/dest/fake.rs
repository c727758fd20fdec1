// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake in-memory destination store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{DestError, DestStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ripple_core::{
    metadata_identity, AttributeMetadata, DestRef, EntityAttrs, EntityId, EntityIdentity,
    Partition, SchemaFact, TxId, Value, WriteOp, WriteSet, WriteValue, SOURCE_T,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Destination ids start here so they visibly diverge from source ids
const FIRST_INDEX: i64 = 1000;

/// Recorded destination call
#[derive(Debug, Clone, PartialEq)]
pub enum DestCall {
    Lookup { identity: EntityIdentity },
    Commit { t: Option<TxId> },
    CreateIfAbsent { fact: SchemaFact },
    Checkpoint,
}

#[derive(Default, Clone)]
struct Tables {
    entities: HashMap<EntityId, EntityAttrs>,
    identities: HashMap<EntityIdentity, EntityId>,
    attributes: HashMap<String, AttributeMetadata>,
    next_index: HashMap<Partition, i64>,
}

impl Tables {
    fn allocate(&mut self, part: Partition) -> EntityId {
        let index = self.next_index.entry(part).or_insert(FIRST_INDEX);
        let id = EntityId::new(part, *index);
        *index += 1;
        self.entities.insert(id, EntityAttrs::new());
        id
    }

    fn bind_identity(&mut self, identity: &EntityIdentity, id: EntityId) {
        if let Some(attrs) = self.entities.get_mut(&id) {
            attrs.insert(identity.attribute.clone(), identity.value.clone());
        }
        self.identities.insert(identity.clone(), id);
    }
}

#[derive(Default)]
struct Inner {
    tables: Tables,
    commits: Vec<WriteSet>,
    instants: Vec<DateTime<Utc>>,
    fail_next_commits: VecDeque<DestError>,
}

/// Fake destination store with its own identifier space
///
/// Commits are atomic: operations are applied to a staged copy of the
/// tables, which is installed only when every operation succeeds.
#[derive(Clone, Default)]
pub struct FakeDestStore {
    inner: Arc<Mutex<Inner>>,
    calls: Arc<Mutex<Vec<DestCall>>>,
}

impl FakeDestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entity answering to `identity`, returning its destination id
    pub fn insert_entity(&self, part: Partition, identity: EntityIdentity) -> EntityId {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let id = inner.tables.allocate(part);
        inner.tables.bind_identity(&identity, id);
        id
    }

    /// Make the next commit fail with the given error
    pub fn fail_next_commit(&self, error: DestError) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .fail_next_commits
            .push_back(error);
    }

    /// Attributes of a destination entity
    pub fn entity(&self, id: EntityId) -> Option<EntityAttrs> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.tables.entities.get(&id).cloned()
    }

    /// Destination entity answering to `identity`, with its attributes
    pub fn entity_by_identity(&self, identity: &EntityIdentity) -> Option<(EntityId, EntityAttrs)> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let id = *inner.tables.identities.get(identity)?;
        let attrs = inner.tables.entities.get(&id).cloned()?;
        Some((id, attrs))
    }

    /// Whether an attribute with this ident has been created
    pub fn has_attribute(&self, ident: &str) -> bool {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.tables.attributes.contains_key(ident)
    }

    /// Number of attributes created so far
    pub fn attribute_count(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.tables.attributes.len()
    }

    /// All committed write-sets, in commit order
    pub fn commits(&self) -> Vec<WriteSet> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.commits.clone()
    }

    /// Wall-clock instants of commits and bootstrap writes, in order
    pub fn write_instants(&self) -> Vec<DateTime<Utc>> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.instants.clone()
    }

    /// All recorded calls
    pub fn calls(&self) -> Vec<DestCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, call: DestCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

/// Apply one write-set to a staged copy of the tables
fn apply(tables: &mut Tables, write_set: &WriteSet) -> Result<(), DestError> {
    let mut tempids: HashMap<(Partition, i64), EntityId> = HashMap::new();

    for op in &write_set.ops {
        match op {
            WriteOp::Assert {
                entity,
                identity,
                attribute,
                value,
            } => {
                let id = resolve_target(tables, &mut tempids, entity, Some(identity))?;
                tables.bind_identity(identity, id);
                let value = resolve_value(tables, &mut tempids, value)?;
                if let Some(attrs) = tables.entities.get_mut(&id) {
                    attrs.insert(attribute.clone(), value);
                }
            }
            WriteOp::Retract {
                identity,
                attribute,
                value,
            } => {
                let Some(&id) = tables.identities.get(identity) else {
                    return Err(DestError::Rejected(format!(
                        "no entity answers to {}",
                        identity
                    )));
                };
                let value = resolve_value(tables, &mut tempids, value)?;
                if let Some(attrs) = tables.entities.get_mut(&id) {
                    if attrs.get(attribute) == Some(&value) {
                        attrs.remove(attribute);
                    }
                }
            }
            WriteOp::Checkpoint { t } => {
                let Some(&id) = tables.identities.get(&metadata_identity()) else {
                    return Err(DestError::Rejected(
                        "replication metadata record missing".to_string(),
                    ));
                };
                if let Some(attrs) = tables.entities.get_mut(&id) {
                    attrs.insert(SOURCE_T.to_string(), Value::I64(t.0));
                }
            }
        }
    }

    Ok(())
}

/// Resolve the entity an assert targets, allocating for provisional refs
fn resolve_target(
    tables: &mut Tables,
    tempids: &mut HashMap<(Partition, i64), EntityId>,
    entity: &DestRef,
    identity: Option<&EntityIdentity>,
) -> Result<EntityId, DestError> {
    match entity {
        DestRef::Existing(id) => {
            if !tables.entities.contains_key(id) {
                return Err(DestError::Rejected(format!("unknown entity {}", id)));
            }
            Ok(*id)
        }
        DestRef::Provisional { part, tempid } => {
            if let Some(id) = tempids.get(&(*part, *tempid)) {
                return Ok(*id);
            }
            // Upsert through the identity when something already answers to
            // it, so a re-translated transaction lands on the same entity.
            let id = identity
                .and_then(|identity| tables.identities.get(identity).copied())
                .unwrap_or_else(|| tables.allocate(*part));
            tempids.insert((*part, *tempid), id);
            Ok(id)
        }
    }
}

/// Resolve a translated value into a storable one
fn resolve_value(
    tables: &mut Tables,
    tempids: &mut HashMap<(Partition, i64), EntityId>,
    value: &WriteValue,
) -> Result<Value, DestError> {
    match value {
        WriteValue::Scalar(v) => Ok(v.clone()),
        WriteValue::Ref(dest_ref) => {
            let id = resolve_target(tables, tempids, dest_ref, None)?;
            Ok(Value::Ref(id))
        }
    }
}

#[async_trait]
impl DestStore for FakeDestStore {
    async fn lookup(&self, identity: &EntityIdentity) -> Result<Option<EntityId>, DestError> {
        self.record(DestCall::Lookup {
            identity: identity.clone(),
        });
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.tables.identities.get(identity).copied())
    }

    async fn commit(
        &self,
        write_set: &WriteSet,
        instant: DateTime<Utc>,
    ) -> Result<(), DestError> {
        self.record(DestCall::Commit {
            t: write_set.checkpoint(),
        });

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(error) = inner.fail_next_commits.pop_front() {
            return Err(error);
        }

        let mut staged = inner.tables.clone();
        apply(&mut staged, write_set)?;

        inner.tables = staged;
        inner.commits.push(write_set.clone());
        inner.instants.push(instant);
        Ok(())
    }

    async fn create_if_absent(
        &self,
        fact: &SchemaFact,
        instant: DateTime<Utc>,
    ) -> Result<(), DestError> {
        self.record(DestCall::CreateIfAbsent { fact: fact.clone() });

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match fact {
            SchemaFact::Attribute(meta) => {
                if inner.tables.attributes.contains_key(&meta.ident) {
                    return Ok(());
                }
                inner
                    .tables
                    .attributes
                    .insert(meta.ident.clone(), meta.clone());
            }
            SchemaFact::Record(identity) => {
                if inner.tables.identities.contains_key(identity) {
                    return Ok(());
                }
                let id = inner.tables.allocate(Partition::DB);
                inner.tables.bind_identity(identity, id);
            }
        }
        inner.instants.push(instant);
        Ok(())
    }

    async fn checkpoint(&self) -> Result<Option<TxId>, DestError> {
        self.record(DestCall::Checkpoint);
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let Some(id) = inner.tables.identities.get(&metadata_identity()) else {
            return Ok(None);
        };
        let t = inner
            .tables
            .entities
            .get(id)
            .and_then(|attrs| attrs.get(SOURCE_T))
            .and_then(|v| match v {
                Value::I64(n) => Some(TxId(*n)),
                _ => None,
            });
        Ok(t)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
