// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the replication engine

use crate::replicator::ReplicatorState;
use ripple_core::EntityId;
use ripple_store::{DestError, SourceError};
use thiserror::Error;

/// Errors that halt a replication run
#[derive(Debug, Error)]
pub enum ReplicationError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("destination error: {0}")]
    Destination(#[from] DestError),
    /// Schema mismatch: the source view has no metadata for an attribute
    /// referenced by a fact. Retrying cannot fix this.
    #[error("attribute {0} has no metadata in the source view")]
    UnknownAttribute(EntityId),
    /// Schema mismatch: a reference attribute carried a non-reference value
    #[error("attribute {attribute} is a reference type but carried a scalar value")]
    ExpectedRef { attribute: String },
    #[error("cannot start replicator in state {0}")]
    CannotStart(ReplicatorState),
    #[error("replication task failed: {0}")]
    TaskFailed(String),
}
