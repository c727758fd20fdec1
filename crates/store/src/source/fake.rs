// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake in-memory source store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{SourceError, SourceStore, SourceView};
use async_trait::async_trait;
use ripple_core::{AttributeMetadata, EntityAttrs, EntityId, Transaction, TxId};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Recorded source call
#[derive(Debug, Clone, PartialEq)]
pub enum SourceCall {
    LogRange { from: TxId, to: Option<TxId> },
    ViewAsOf { t: TxId },
    Entity { e: EntityId },
    Attribute { a: EntityId },
}

#[derive(Default)]
struct Inner {
    log: Vec<Transaction>,
    entities: HashMap<EntityId, EntityAttrs>,
    attributes: HashMap<EntityId, AttributeMetadata>,
    fail_next_reads: VecDeque<String>,
}

/// Fake source store backed by an in-memory log and entity tables
#[derive(Clone, Default)]
pub struct FakeSourceStore {
    inner: Arc<Mutex<Inner>>,
    calls: Arc<Mutex<Vec<SourceCall>>>,
}

impl FakeSourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transaction to the log. Positions must arrive in order.
    pub fn append(&self, tx: Transaction) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(last) = inner.log.last() {
            debug_assert!(tx.t > last.t, "log positions must increase");
        }
        inner.log.push(tx);
    }

    /// Seed an entity's attributes
    pub fn insert_entity(&self, e: EntityId, attrs: EntityAttrs) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entities
            .insert(e, attrs);
    }

    /// Seed an attribute's metadata
    pub fn define_attribute(&self, a: EntityId, meta: AttributeMetadata) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .attributes
            .insert(a, meta);
    }

    /// Make the next log read fail with the given message
    pub fn fail_next_read(&self, message: impl Into<String>) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .fail_next_reads
            .push_back(message.into());
    }

    /// All recorded calls
    pub fn calls(&self) -> Vec<SourceCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of log reads performed so far
    pub fn read_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, SourceCall::LogRange { .. }))
            .count()
    }

    fn record(&self, call: SourceCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

#[async_trait]
impl SourceStore for FakeSourceStore {
    type View = FakeSourceView;

    async fn log_range(
        &self,
        from: TxId,
        to: Option<TxId>,
    ) -> Result<Vec<Transaction>, SourceError> {
        self.record(SourceCall::LogRange { from, to });

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(message) = inner.fail_next_reads.pop_front() {
            return Err(SourceError::ReadFailed(message));
        }

        Ok(inner
            .log
            .iter()
            .filter(|tx| tx.t >= from && to.map_or(true, |upper| tx.t < upper))
            .cloned()
            .collect())
    }

    async fn view_as_of(&self, t: TxId) -> Result<Self::View, SourceError> {
        self.record(SourceCall::ViewAsOf { t });
        Ok(FakeSourceView {
            as_of: t,
            store: self.clone(),
        })
    }
}

/// Point-in-time view over the fake store
///
/// The fake keeps a single entity table rather than full history; the view
/// records its basis point so tests can assert which view was requested.
#[derive(Clone)]
pub struct FakeSourceView {
    pub as_of: TxId,
    store: FakeSourceStore,
}

#[async_trait]
impl SourceView for FakeSourceView {
    async fn entity(&self, e: EntityId) -> Result<EntityAttrs, SourceError> {
        self.store.record(SourceCall::Entity { e });
        let inner = self.store.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.entities.get(&e).cloned().unwrap_or_default())
    }

    async fn attribute(&self, a: EntityId) -> Result<Option<AttributeMetadata>, SourceError> {
        self.store.record(SourceCall::Attribute { a });
        let inner = self.store.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.attributes.get(&a).cloned())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
