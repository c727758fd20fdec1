//! ripple-core: Data model for the ripple replication engine
//!
//! This crate provides:
//! - Entity, transaction, and value types mirrored from the source log
//! - Attribute metadata and stable entity identities (lookup-refs)
//! - The write-set vocabulary consumed by destination commits
//! - The replication configuration record

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod attr;
pub mod config;
pub mod fact;
pub mod identity;
pub mod tx;
pub mod value;
pub mod write;

// Re-exports
pub use attr::{AttributeMetadata, Cardinality, EntityAttrs, ValueType};
pub use config::{parse_config, ConfigError, ReplicationConfig};
pub use fact::{EntityId, Fact, Partition};
pub use identity::{
    metadata_identity, source_eid_identity, EntityIdentity, DB_IDENT, METADATA_NAME, SOURCE_EID,
    SOURCE_T,
};
pub use tx::{Transaction, TxId};
pub use value::Value;
pub use write::{DestRef, SchemaFact, WriteOp, WriteSet, WriteValue};
