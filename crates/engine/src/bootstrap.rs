// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Destination bootstrap
//!
//! Prepares a fresh or pre-existing destination for replication. All writes
//! are declarative ensure-exists operations, so running bootstrap any
//! number of times leaves exactly one source-eid attribute, one checkpoint
//! attribute, and one metadata record. The bootstrap commit is stamped with
//! the first replicated transaction's instant so the destination's own
//! history starts at a time consistent with the replicated stream.

use crate::error::ReplicationError;
use chrono::{DateTime, Utc};
use ripple_core::{
    metadata_identity, AttributeMetadata, SchemaFact, SOURCE_EID, SOURCE_T,
};
use ripple_store::DestStore;

/// Ensure the destination carries the replication schema and metadata record
pub async fn bootstrap<D: DestStore>(
    dest: &D,
    first_instant: DateTime<Utc>,
) -> Result<(), ReplicationError> {
    tracing::info!(instant = %first_instant, "bootstrapping destination");

    dest.create_if_absent(
        &SchemaFact::Attribute(AttributeMetadata::scalar(SOURCE_EID).unique()),
        first_instant,
    )
    .await?;

    dest.create_if_absent(
        &SchemaFact::Attribute(AttributeMetadata::scalar(SOURCE_T)),
        first_instant,
    )
    .await?;

    dest.create_if_absent(&SchemaFact::Record(metadata_identity()), first_instant)
        .await?;

    Ok(())
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
