// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Store adapters: the source log and the destination database

pub mod dest;
pub mod source;

pub use dest::{DestError, DestStore};
pub use source::{SourceError, SourceStore, SourceView};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use dest::{DestCall, FakeDestStore};
#[cfg(any(test, feature = "test-support"))]
pub use source::{FakeSourceStore, SourceCall};
