// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attribute metadata

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attributes of one entity, keyed by attribute ident
pub type EntityAttrs = BTreeMap<String, Value>;

/// Declared type of an attribute's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    /// Values are copied to the destination as-is
    Scalar,
    /// Values name another entity and must be translated
    Ref,
}

/// Declared cardinality of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    One,
    Many,
}

/// Per-attribute schema consulted during translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMetadata {
    /// Stable keyword name, e.g. `:user/email`
    pub ident: String,
    pub value_type: ValueType,
    pub cardinality: Cardinality,
    /// Whether values uniquely identify an entity
    pub unique: bool,
}

impl AttributeMetadata {
    /// A cardinality-one scalar attribute
    pub fn scalar(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            value_type: ValueType::Scalar,
            cardinality: Cardinality::One,
            unique: false,
        }
    }

    /// A cardinality-one reference attribute
    pub fn reference(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            value_type: ValueType::Ref,
            cardinality: Cardinality::One,
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn many(mut self) -> Self {
        self.cardinality = Cardinality::Many;
        self
    }
}
