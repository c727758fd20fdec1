// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity identity resolution
//!
//! Maps a source entity id to its stable identity (lookup-ref) using a
//! point-in-time view of the source database. The policy deciding which
//! identifying pair to use is an explicit strategy passed in at
//! construction; resolution is memoized for the lifetime of one
//! transaction's processing so repeated lookups of the same entity return
//! the identical identity without re-querying the view.

use crate::error::ReplicationError;
use ripple_core::{source_eid_identity, EntityAttrs, EntityId, EntityIdentity, DB_IDENT};
use ripple_store::SourceView;
use std::collections::HashMap;

/// Strategy choosing the identifying pair for an entity
pub trait IdentityPolicy: Send + Sync {
    /// Resolve the stable identity for `e`, given its attributes as of the
    /// transaction being processed
    fn resolve(&self, e: EntityId, attrs: &EntityAttrs) -> EntityIdentity;
}

/// Default policy: the entity's globally-unique `:db/ident` when it carries
/// one, otherwise the synthetic source-eid pair
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentPolicy;

impl IdentityPolicy for IdentPolicy {
    fn resolve(&self, e: EntityId, attrs: &EntityAttrs) -> EntityIdentity {
        match attrs.get(DB_IDENT) {
            Some(value) => EntityIdentity::new(DB_IDENT, value.clone()),
            None => source_eid_identity(e),
        }
    }
}

/// Memoizing resolver scoped to one transaction's processing
pub struct IdentityResolver<'a, V> {
    view: &'a V,
    policy: &'a dyn IdentityPolicy,
    cache: HashMap<EntityId, EntityIdentity>,
}

impl<'a, V: SourceView> IdentityResolver<'a, V> {
    pub fn new(view: &'a V, policy: &'a dyn IdentityPolicy) -> Self {
        Self {
            view,
            policy,
            cache: HashMap::new(),
        }
    }

    /// The stable identity of `e`. The first call per entity queries the
    /// view; later calls return the cached identity.
    pub async fn resolve(&mut self, e: EntityId) -> Result<EntityIdentity, ReplicationError> {
        if let Some(identity) = self.cache.get(&e) {
            return Ok(identity.clone());
        }
        let attrs = self.view.entity(e).await?;
        let identity = self.policy.resolve(e, &attrs);
        self.cache.insert(e, identity.clone());
        Ok(identity)
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
