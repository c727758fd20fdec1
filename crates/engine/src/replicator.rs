// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replication orchestration
//!
//! A replicator owns one poller task and one processing loop. The loop
//! consumes transactions in order, bootstraps the destination on the first
//! one, and applies each as a single atomic commit. Stop is final: a
//! stopped instance cannot be restarted, and resuming requires a new
//! instance, which picks up at the destination checkpoint.

use crate::bootstrap::bootstrap;
use crate::error::ReplicationError;
use crate::poller::{LogPoller, PollerHandle};
use crate::resolver::{IdentPolicy, IdentityPolicy};
use crate::translate::TxTranslator;
use chrono::{DateTime, Utc};
use ripple_core::{ReplicationConfig, Transaction};
use ripple_store::{DestStore, SourceError, SourceStore};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;

/// Lifecycle of a replicator instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicatorState {
    Created,
    Running,
    /// Terminal: reached by `stop` or by a halting failure
    Stopped,
}

impl fmt::Display for ReplicatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicatorState::Created => write!(f, "created"),
            ReplicatorState::Running => write!(f, "running"),
            ReplicatorState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Bootstrap procedure override
pub type BootstrapFn<D> = Arc<
    dyn Fn(D, DateTime<Utc>) -> Pin<Box<dyn Future<Output = Result<(), ReplicationError>> + Send>>
        + Send
        + Sync,
>;

fn default_bootstrap<D: DestStore>() -> BootstrapFn<D> {
    Arc::new(|dest: D, instant| Box::pin(async move { bootstrap(&dest, instant).await }))
}

/// Replicates the source log into the destination until stopped
pub struct Replicator<S: SourceStore, D: DestStore> {
    source: S,
    dest: D,
    config: ReplicationConfig,
    policy: Arc<dyn IdentityPolicy>,
    bootstrap: BootstrapFn<D>,
    state: Arc<Mutex<ReplicatorState>>,
    shutdown: watch::Sender<bool>,
    task: Option<tokio::task::JoinHandle<Result<(), ReplicationError>>>,
}

impl<S, D> Replicator<S, D>
where
    S: SourceStore,
    D: DestStore,
{
    pub fn new(source: S, dest: D, config: ReplicationConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            source,
            dest,
            config,
            policy: Arc::new(IdentPolicy),
            bootstrap: default_bootstrap(),
            state: Arc::new(Mutex::new(ReplicatorState::Created)),
            shutdown,
            task: None,
        }
    }

    /// Replace the default identity-resolution policy
    pub fn with_identity_policy(mut self, policy: Arc<dyn IdentityPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the default bootstrap procedure
    pub fn with_bootstrap(mut self, bootstrap: BootstrapFn<D>) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> ReplicatorState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Begin replicating. The effective starting position is the explicit
    /// override when configured, else one past the destination checkpoint,
    /// else the log's origin.
    pub async fn start(&mut self) -> Result<(), ReplicationError> {
        let current = self.state();
        if current != ReplicatorState::Created {
            return Err(ReplicationError::CannotStart(current));
        }

        let start_t = match self.config.start_t {
            Some(t) => Some(t),
            None => match self.dest.checkpoint().await {
                Ok(checkpoint) => checkpoint.map(|t| t.next()),
                Err(e) => {
                    self.set_state(ReplicatorState::Stopped);
                    return Err(e.into());
                }
            },
        };
        tracing::info!(start = ?start_t, "replicator starting");

        let (rx, poller) = LogPoller::open(
            self.source.clone(),
            start_t,
            self.config.poll_interval,
        );
        let worker = Worker {
            source: self.source.clone(),
            dest: self.dest.clone(),
            policy: Arc::clone(&self.policy),
            bootstrap: Arc::clone(&self.bootstrap),
            retry_pause: self.config.retry_pause,
            state: Arc::clone(&self.state),
        };
        let shutdown_rx = self.shutdown.subscribe();

        self.set_state(ReplicatorState::Running);
        self.task = Some(tokio::spawn(worker.run(rx, poller, shutdown_rx)));
        Ok(())
    }

    /// Stop replicating. The in-flight transaction, if any, is allowed to
    /// finish; no further commits occur. Surfaces the loop's error when it
    /// halted on its own.
    pub async fn stop(&mut self) -> Result<(), ReplicationError> {
        let _ = self.shutdown.send(true);
        let result = match self.task.take() {
            Some(task) => task
                .await
                .map_err(|e| ReplicationError::TaskFailed(e.to_string()))?,
            None => Ok(()),
        };
        self.set_state(ReplicatorState::Stopped);
        result
    }

    fn set_state(&self, next: ReplicatorState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }
}

/// Outcome of applying one transaction
enum Applied {
    Committed,
    /// A stop request arrived during the transient-retry pause; the
    /// transaction was abandoned before committing
    Cancelled,
}

/// The single processing loop behind a running replicator
struct Worker<S: SourceStore, D: DestStore> {
    source: S,
    dest: D,
    policy: Arc<dyn IdentityPolicy>,
    bootstrap: BootstrapFn<D>,
    retry_pause: Duration,
    state: Arc<Mutex<ReplicatorState>>,
}

impl<S, D> Worker<S, D>
where
    S: SourceStore,
    D: DestStore,
{
    async fn run(
        self,
        mut rx: mpsc::Receiver<Result<Transaction, SourceError>>,
        poller: PollerHandle,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), ReplicationError> {
        let mut bootstrapped = false;

        let result = loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.changed() => break Ok(()),
                next = rx.recv() => next,
            };
            // Poller gone: its failure, if any, was already emitted
            let Some(next) = next else { break Ok(()) };
            let tx = match next {
                Ok(tx) => tx,
                Err(e) => break Err(ReplicationError::from(e)),
            };

            if !bootstrapped {
                if let Err(e) = (self.bootstrap)(self.dest.clone(), tx.instant).await {
                    break Err(e);
                }
                bootstrapped = true;
            }

            match self.apply(&tx, &mut shutdown).await {
                Ok(Applied::Committed) => {
                    tracing::debug!(t = %tx.t, facts = tx.facts.len(), "transaction applied");
                }
                Ok(Applied::Cancelled) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        poller.shutdown().await;
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = ReplicatorState::Stopped;
        if let Err(e) = &result {
            tracing::error!(error = %e, "replication halted");
        }
        result
    }

    /// Translate and commit one transaction, retrying transient commit
    /// failures from scratch so identities re-resolve against the current
    /// destination state.
    async fn apply(
        &self,
        tx: &Transaction,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<Applied, ReplicationError> {
        loop {
            let view = self.source.view_as_of(tx.t).await?;
            let write_set = TxTranslator::new(&view, &self.dest, self.policy.as_ref())
                .translate(tx)
                .await?;

            match self.dest.commit(&write_set, tx.instant).await {
                Ok(()) => return Ok(Applied::Committed),
                Err(e) if e.is_transient() => {
                    tracing::warn!(
                        t = %tx.t,
                        error = %e,
                        pause = ?self.retry_pause,
                        "transient commit failure, retrying"
                    );
                    tokio::select! {
                        biased;
                        _ = shutdown.changed() => return Ok(Applied::Cancelled),
                        _ = sleep(self.retry_pause) => {}
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
#[path = "replicator_tests.rs"]
mod tests;
