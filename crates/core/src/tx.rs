// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transactions: ordered positions in the source log

use crate::fact::Fact;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical position of a transaction in the source log
///
/// Positions are totally ordered and strictly increasing; the engine
/// processes them in order, never skipping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TxId(pub i64);

impl TxId {
    /// The start of the log
    pub const ORIGIN: TxId = TxId(0);

    /// The position immediately after this one
    pub fn next(&self) -> TxId {
        TxId(self.0 + 1)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// One atomic batch of facts from the source log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Position in the log
    pub t: TxId,
    /// Wall-clock time the source committed this transaction
    pub instant: DateTime<Utc>,
    /// Facts committed atomically at this position, in source order
    pub facts: Vec<Fact>,
}

impl Transaction {
    pub fn new(t: TxId, instant: DateTime<Utc>, facts: Vec<Fact>) -> Self {
        Self { t, instant, facts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_advances_by_one() {
        assert_eq!(TxId(41).next(), TxId(42));
        assert_eq!(TxId::ORIGIN.next(), TxId(1));
    }

    #[test]
    fn tx_ids_are_totally_ordered() {
        assert!(TxId(1) < TxId(2));
        assert!(TxId(2) < TxId(10));
    }
}
