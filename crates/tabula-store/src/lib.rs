//! tabula-store: record store adapters for tabula.
//!
//! [`MemoryStore`] keeps every record in memory and evaluates
//! [`EntityQuery`](tabula_core::store::EntityQuery) conditions itself. Load it
//! from a JSON fixture document with [`MemoryStore::from_path`] or fill it
//! with [`MemoryStore::insert`].

pub mod fixture;
pub mod memory;

pub use fixture::FixtureError;
pub use memory::MemoryStore;
