//! Shared test utilities for tabula integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. Every helper is deterministic: fixtures are embedded
//! strings and stores are in memory.

pub mod assertions;
pub mod builders;
pub mod fake_store;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fake_store::*;
pub use fixtures::*;
