//! tabula-core: configuration-driven record search and HTML table reports.
//!
//! This crate exposes the search and rendering layers as public modules, plus
//! the shared types, the static report profile and the record-store seam.
//!
//! # Architecture
//!
//! ```text
//!                 ReportProfile (criteria, columns, lease terms)
//!                        │
//! ReportFacade ──► SearchEngine ──► RecordStore ──► RecordSet
//!      │                │                               │
//!      │          ValueConverter                        ▼
//!      └──────────────────────────────────► HtmlTableRenderer ──► RenderedReport
//!                                                  │
//!                                          LocalizationResolver
//! ```
//!
//! Everything here is synchronous. The profile is immutable once loaded and
//! can be shared across threads; each call owns its record set and output.

pub mod config;
pub mod convert;
pub mod error;
pub mod facade;
pub mod locale;
pub mod profile;
pub mod render;
pub mod search;
pub mod store;
pub mod types;

pub use config::{ConfigLookup, LayeredConfig};
pub use error::{ConfigError, ConversionError, ProfileError, ReportError, StoreError};
pub use facade::{ReportFacade, ReportOptions};
pub use profile::ReportProfile;
pub use store::RecordStore;
pub use types::{FieldValue, LanguageTag, Record, RecordSet, RenderedReport};
