// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transaction log poller
//!
//! Tails the source log from a starting position and emits transactions in
//! order on a bounded channel. When caught up it sleeps for the poll
//! interval instead of busy-looping. Cancellation is cooperative: the token
//! is observed at iteration boundaries, after which the producer performs
//! no further log reads and no further emissions. A poller is not
//! restartable; resuming requires a new `open` with a new start position.

use ripple_core::{Transaction, TxId};
use ripple_store::{SourceError, SourceStore};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;

const CHANNEL_CAPACITY: usize = 64;

/// Handle controlling a running poller task
pub struct PollerHandle {
    cancel: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl PollerHandle {
    /// Stop the poller. Observed at the top of its next iteration.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Stop the poller and wait for its task to finish
    pub async fn shutdown(self) {
        self.cancel();
        let _ = self.task.await;
    }
}

/// Polls the source log and streams transactions in order
pub struct LogPoller;

impl LogPoller {
    /// Start polling at `start` (or the log's origin), emitting each
    /// transaction on the returned channel. A source read failure is
    /// emitted once and terminates the producer.
    pub fn open<S: SourceStore>(
        source: S,
        start: Option<TxId>,
        poll_interval: Duration,
    ) -> (mpsc::Receiver<Result<Transaction, SourceError>>, PollerHandle) {
        let (tx_out, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (cancel, cancel_rx) = watch::channel(false);

        let task = tokio::spawn(run(source, start, poll_interval, tx_out, cancel_rx));

        (rx, PollerHandle { cancel, task })
    }
}

async fn run<S: SourceStore>(
    source: S,
    start: Option<TxId>,
    poll_interval: Duration,
    tx_out: mpsc::Sender<Result<Transaction, SourceError>>,
    mut cancel: watch::Receiver<bool>,
) {
    let mut cursor = start.unwrap_or(TxId::ORIGIN);
    tracing::debug!(%cursor, "poller started");

    loop {
        if *cancel.borrow() {
            break;
        }

        let batch = tokio::select! {
            _ = cancel.changed() => break,
            batch = source.log_range(cursor, None) => batch,
        };

        match batch {
            Ok(batch) if batch.is_empty() => {
                // Caught up; back off until the next poll
                tokio::select! {
                    _ = cancel.changed() => break,
                    _ = sleep(poll_interval) => {}
                }
            }
            Ok(batch) => {
                for tx in batch {
                    cursor = tx.t.next();
                    if tx_out.send(Ok(tx)).await.is_err() {
                        // Receiver gone; nothing left to emit to
                        return;
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, %cursor, "log read failed");
                let _ = tx_out.send(Err(e)).await;
                return;
            }
        }
    }

    tracing::debug!(%cursor, "poller cancelled");
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
