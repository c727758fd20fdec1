// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fact values

use crate::fact::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value carried by a fact
///
/// Scalars are copied to the destination verbatim; `Ref` values name another
/// entity and must be translated into the destination's identity space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Str(String),
    /// Interned name such as `:dept/eng`
    Keyword(String),
    I64(i64),
    Bool(bool),
    Instant(DateTime<Utc>),
    /// Reference to another entity in the same database
    Ref(EntityId),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn keyword(s: impl Into<String>) -> Self {
        Value::Keyword(s.into())
    }

    /// True when the value names another entity
    pub fn is_ref(&self) -> bool {
        matches!(self, Value::Ref(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Keyword(k) => write!(f, "{}", k),
            Value::I64(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Instant(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Ref(e) => write!(f, "#ref {}", e),
        }
    }
}

impl From<EntityId> for Value {
    fn from(e: EntityId) -> Self {
        Value::Ref(e)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::I64(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}
