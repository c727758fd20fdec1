// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source store: an ordered, append-only transaction log with
//! point-in-time entity and attribute lookups

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSourceStore, FakeSourceView, SourceCall};

use async_trait::async_trait;
use ripple_core::{AttributeMetadata, EntityAttrs, EntityId, Transaction, TxId};
use thiserror::Error;

/// Errors from source store operations
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("log read failed: {0}")]
    ReadFailed(String),
    #[error("no view available as of {0}")]
    ViewUnavailable(TxId),
}

/// The source database's transaction log
#[async_trait]
pub trait SourceStore: Clone + Send + Sync + 'static {
    type View: SourceView + Send + Sync;

    /// Ordered transactions in `[from, to)`; `None` means "through latest".
    /// Returns an empty batch when the log has nothing at or past `from`.
    async fn log_range(
        &self,
        from: TxId,
        to: Option<TxId>,
    ) -> Result<Vec<Transaction>, SourceError>;

    /// The database as of position `t`, for point-in-time lookups
    async fn view_as_of(&self, t: TxId) -> Result<Self::View, SourceError>;
}

/// Point-in-time view of the source database
#[async_trait]
pub trait SourceView {
    /// Attributes of an entity as of this view's basis point.
    /// Empty when the entity does not exist.
    async fn entity(&self, e: EntityId) -> Result<EntityAttrs, SourceError>;

    /// Metadata for an attribute entity, if `a` names one
    async fn attribute(&self, a: EntityId) -> Result<Option<AttributeMetadata>, SourceError>;
}
