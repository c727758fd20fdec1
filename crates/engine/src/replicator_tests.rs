// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use ripple_core::{
    source_eid_identity, AttributeMetadata, EntityAttrs, EntityId, Fact, Partition, TxId, Value,
    DB_IDENT, SOURCE_EID,
};
use ripple_store::{DestError, FakeDestStore, FakeSourceStore, SourceCall};

const WAIT: Duration = Duration::from_secs(2);

const NAME_ATTR: i64 = 1;
const MANAGER_ATTR: i64 = 2;

fn attr(index: i64) -> EntityId {
    EntityId::new(Partition::DB, index)
}

fn user(index: i64) -> EntityId {
    EntityId::new(Partition::USER, index)
}

fn seeded_source() -> FakeSourceStore {
    let store = FakeSourceStore::new();
    store.define_attribute(attr(NAME_ATTR), AttributeMetadata::scalar(":name"));
    store.define_attribute(attr(MANAGER_ATTR), AttributeMetadata::reference(":manager"));
    let mut attrs = EntityAttrs::new();
    attrs.insert(DB_IDENT.to_string(), Value::keyword(":dept/eng"));
    store.insert_entity(user(9), attrs);
    store
}

fn name_tx(t: i64, entity: i64, name: &str) -> Transaction {
    Transaction::new(
        TxId(t),
        Utc::now(),
        vec![Fact::assert(
            user(entity),
            attr(NAME_ATTR),
            Value::str(name),
            TxId(t),
        )],
    )
}

fn fast_config() -> ReplicationConfig {
    ReplicationConfig {
        start_t: None,
        poll_interval: Duration::from_millis(5),
        retry_pause: Duration::from_millis(10),
    }
}

fn replicator(
    source: &FakeSourceStore,
    dest: &FakeDestStore,
) -> Replicator<FakeSourceStore, FakeDestStore> {
    Replicator::new(source.clone(), dest.clone(), fast_config())
}

async fn wait_for_checkpoint(dest: &FakeDestStore, t: TxId) {
    let deadline = tokio::time::Instant::now() + WAIT;
    loop {
        if dest.checkpoint().await.unwrap() == Some(t) {
            return;
        }
        if tokio::time::Instant::now() > deadline {
            panic!("checkpoint never reached {}", t);
        }
        sleep(Duration::from_millis(5)).await;
    }
}

async fn wait_for_stopped(rep: &Replicator<FakeSourceStore, FakeDestStore>) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while rep.state() != ReplicatorState::Stopped {
        if tokio::time::Instant::now() > deadline {
            panic!("replicator never stopped");
        }
        sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn applies_transactions_in_order() {
    let source = seeded_source();
    let dest = FakeDestStore::new();
    source.append(name_tx(1, 5, "Alice"));
    source.append(name_tx(2, 6, "Bob"));

    let mut rep = replicator(&source, &dest);
    rep.start().await.unwrap();
    wait_for_checkpoint(&dest, TxId(2)).await;
    rep.stop().await.unwrap();

    let checkpoints: Vec<_> = dest.commits().iter().filter_map(|w| w.checkpoint()).collect();
    assert_eq!(checkpoints, vec![TxId(1), TxId(2)]);

    let (_, attrs) = dest
        .entity_by_identity(&source_eid_identity(user(5)))
        .unwrap();
    assert_eq!(attrs.get(":name"), Some(&Value::str("Alice")));
}

#[tokio::test]
async fn references_resolve_across_identity_spaces() {
    let source = seeded_source();
    let dest = FakeDestStore::new();
    source.append(Transaction::new(
        TxId(100),
        Utc::now(),
        vec![
            Fact::assert(user(5), attr(NAME_ATTR), Value::str("Alice"), TxId(100)),
            Fact::assert(user(5), attr(MANAGER_ATTR), Value::Ref(user(9)), TxId(100)),
        ],
    ));

    let mut rep = replicator(&source, &dest);
    rep.start().await.unwrap();
    wait_for_checkpoint(&dest, TxId(100)).await;
    rep.stop().await.unwrap();

    let (alice, attrs) = dest
        .entity_by_identity(&source_eid_identity(user(5)))
        .unwrap();
    // Alice got a fresh destination id in the same partition
    assert_eq!(alice.partition(), Partition::USER);
    assert_ne!(alice, user(5));

    // The manager ref points at the destination entity for :dept/eng
    let (eng, _) = dest
        .entity_by_identity(&ripple_core::EntityIdentity::new(
            DB_IDENT,
            Value::keyword(":dept/eng"),
        ))
        .unwrap();
    assert_eq!(attrs.get(":manager"), Some(&Value::Ref(eng)));
}

#[tokio::test]
async fn bootstrap_runs_once_with_the_first_transaction_instant() {
    let source = seeded_source();
    let dest = FakeDestStore::new();
    let instant = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().unwrap();
    source.append(Transaction::new(
        TxId(1),
        instant,
        vec![Fact::assert(
            user(5),
            attr(NAME_ATTR),
            Value::str("Alice"),
            TxId(1),
        )],
    ));

    let mut rep = replicator(&source, &dest);
    rep.start().await.unwrap();
    wait_for_checkpoint(&dest, TxId(1)).await;
    rep.stop().await.unwrap();

    assert!(dest.has_attribute(SOURCE_EID));
    assert!(dest.write_instants().iter().all(|i| *i == instant));
}

#[tokio::test]
async fn fresh_instance_resumes_past_the_checkpoint() {
    let source = seeded_source();
    let dest = FakeDestStore::new();
    source.append(name_tx(1, 5, "Alice"));
    source.append(name_tx(2, 6, "Bob"));

    let mut first = replicator(&source, &dest);
    first.start().await.unwrap();
    wait_for_checkpoint(&dest, TxId(2)).await;
    first.stop().await.unwrap();

    let mut second = replicator(&source, &dest);
    second.start().await.unwrap();
    source.append(name_tx(3, 7, "Carol"));
    wait_for_checkpoint(&dest, TxId(3)).await;
    second.stop().await.unwrap();

    // Nothing applied twice, nothing skipped
    let checkpoints: Vec<_> = dest.commits().iter().filter_map(|w| w.checkpoint()).collect();
    assert_eq!(checkpoints, vec![TxId(1), TxId(2), TxId(3)]);

    // The second instance opened its poller one past the checkpoint
    assert!(source
        .calls()
        .iter()
        .any(|c| matches!(c, SourceCall::LogRange { from: TxId(3), .. })));
    // Bootstrap stayed idempotent across instances
    assert_eq!(dest.attribute_count(), 2);
}

#[tokio::test]
async fn explicit_start_override_wins_over_the_checkpoint() {
    let source = seeded_source();
    let dest = FakeDestStore::new();
    source.append(name_tx(1, 5, "Alice"));
    source.append(name_tx(2, 6, "Bob"));

    let config = ReplicationConfig {
        start_t: Some(TxId(2)),
        ..fast_config()
    };
    let mut rep = Replicator::new(source.clone(), dest.clone(), config);
    rep.start().await.unwrap();
    wait_for_checkpoint(&dest, TxId(2)).await;
    rep.stop().await.unwrap();

    let checkpoints: Vec<_> = dest.commits().iter().filter_map(|w| w.checkpoint()).collect();
    assert_eq!(checkpoints, vec![TxId(2)]);
}

#[tokio::test]
async fn transient_commit_failure_is_retried() {
    let source = seeded_source();
    let dest = FakeDestStore::new();
    dest.fail_next_commit(DestError::CommitTimeout);
    source.append(name_tx(1, 5, "Alice"));

    let mut rep = replicator(&source, &dest);
    rep.start().await.unwrap();
    wait_for_checkpoint(&dest, TxId(1)).await;
    rep.stop().await.unwrap();

    // Two attempts, one applied transaction
    let attempts = dest
        .calls()
        .iter()
        .filter(|c| matches!(c, ripple_store::DestCall::Commit { .. }))
        .count();
    assert_eq!(attempts, 2);
    assert_eq!(dest.commits().len(), 1);
}

#[tokio::test]
async fn fatal_commit_failure_halts_without_moving_the_checkpoint() {
    let source = seeded_source();
    let dest = FakeDestStore::new();
    dest.fail_next_commit(DestError::Rejected("schema mismatch".to_string()));
    source.append(name_tx(1, 5, "Alice"));

    let mut rep = replicator(&source, &dest);
    rep.start().await.unwrap();
    wait_for_stopped(&rep).await;

    assert_eq!(dest.checkpoint().await.unwrap(), None);
    assert!(dest.commits().is_empty());
    let err = rep.stop().await.unwrap_err();
    assert!(matches!(
        err,
        ReplicationError::Destination(DestError::Rejected(_))
    ));
}

#[tokio::test]
async fn source_read_failure_halts_the_instance() {
    let source = seeded_source();
    let dest = FakeDestStore::new();
    source.fail_next_read("connection reset");

    let mut rep = replicator(&source, &dest);
    rep.start().await.unwrap();
    wait_for_stopped(&rep).await;

    let err = rep.stop().await.unwrap_err();
    assert!(matches!(err, ReplicationError::Source(_)));
}

#[tokio::test]
async fn translation_inconsistency_halts_the_instance() {
    let source = FakeSourceStore::new();
    let dest = FakeDestStore::new();
    // :name has no attribute metadata in this source
    source.append(name_tx(1, 5, "Alice"));

    let mut rep = replicator(&source, &dest);
    rep.start().await.unwrap();
    wait_for_stopped(&rep).await;

    assert_eq!(dest.checkpoint().await.unwrap(), None);
    let err = rep.stop().await.unwrap_err();
    assert!(matches!(err, ReplicationError::UnknownAttribute(_)));
}

#[tokio::test]
async fn stop_is_final() {
    let source = seeded_source();
    let dest = FakeDestStore::new();

    let mut rep = replicator(&source, &dest);
    rep.start().await.unwrap();
    assert_eq!(rep.state(), ReplicatorState::Running);
    rep.stop().await.unwrap();
    assert_eq!(rep.state(), ReplicatorState::Stopped);

    let err = rep.start().await.unwrap_err();
    assert!(matches!(
        err,
        ReplicationError::CannotStart(ReplicatorState::Stopped)
    ));
}

#[tokio::test]
async fn stop_before_start_is_terminal_too() {
    let source = seeded_source();
    let dest = FakeDestStore::new();

    let mut rep = replicator(&source, &dest);
    rep.stop().await.unwrap();
    assert_eq!(rep.state(), ReplicatorState::Stopped);
    assert!(rep.start().await.is_err());
}

#[tokio::test]
async fn custom_bootstrap_replaces_the_default() {
    let source = seeded_source();
    let dest = FakeDestStore::new();
    source.append(name_tx(1, 5, "Alice"));

    // A bootstrap that also prepares a tenant marker record
    let marker = ripple_core::EntityIdentity::new(DB_IDENT, Value::keyword(":tenant/acme"));
    let marker_for_bootstrap = marker.clone();
    let mut rep = replicator(&source, &dest).with_bootstrap(Arc::new(move |dest, instant| {
        let marker = marker_for_bootstrap.clone();
        Box::pin(async move {
            bootstrap(&dest, instant).await?;
            dest.create_if_absent(&ripple_core::SchemaFact::Record(marker), instant)
                .await?;
            Ok(())
        })
    }));

    rep.start().await.unwrap();
    wait_for_checkpoint(&dest, TxId(1)).await;
    rep.stop().await.unwrap();

    assert!(dest.entity_by_identity(&marker).is_some());
}
