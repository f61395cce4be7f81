//! tabula: configuration-driven record search with localized HTML reports.
//!
//! The search and rendering engine lives in [`tabula_core`]; record stores
//! live in [`tabula_store`]. This crate adds the wiring used by the binary
//! and the HTTP transport, so integration tests can import them directly.
//!
//! # Architecture
//!
//! ```text
//! config.toml ──► LayeredConfig ──► app::build_facade ──► ReportFacade
//!                                                            │
//!                          CLI `run` ◄───────────────────────┤
//!                   HTTP `GET /report` (server) ◄────────────┘
//! ```

pub mod app;
pub mod server;

pub use tabula_core;
pub use tabula_store;
