// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Destination store: entity lookup by identity, atomic write-set commits,
//! and declarative schema bootstrap

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{DestCall, FakeDestStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ripple_core::{EntityId, EntityIdentity, SchemaFact, TxId, WriteSet};
use thiserror::Error;

/// Errors from destination store operations
#[derive(Debug, Clone, Error)]
pub enum DestError {
    /// Recoverable overload condition; the commit may succeed if retried
    #[error("destination commit timed out")]
    CommitTimeout,
    #[error("commit rejected: {0}")]
    Rejected(String),
    #[error("destination unavailable: {0}")]
    Unavailable(String),
}

impl DestError {
    /// Whether retrying the same transaction can fix this error
    pub fn is_transient(&self) -> bool {
        matches!(self, DestError::CommitTimeout)
    }
}

/// The destination database
#[async_trait]
pub trait DestStore: Clone + Send + Sync + 'static {
    /// Concrete id of the entity answering to `identity`, if present
    async fn lookup(&self, identity: &EntityIdentity) -> Result<Option<EntityId>, DestError>;

    /// Atomically apply a write-set, stamped with the source transaction's
    /// wall-clock instant. All operations apply or none do.
    async fn commit(&self, write_set: &WriteSet, instant: DateTime<Utc>)
        -> Result<(), DestError>;

    /// Ensure a schema-level fact exists. Safe to call repeatedly; never
    /// duplicates attributes or records.
    async fn create_if_absent(
        &self,
        fact: &SchemaFact,
        instant: DateTime<Utc>,
    ) -> Result<(), DestError>;

    /// Position of the most recently fully-applied source transaction, read
    /// from the replication metadata record. `None` when replication has
    /// never run against this destination.
    async fn checkpoint(&self) -> Result<Option<TxId>, DestError>;
}
