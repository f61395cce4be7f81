//! Error taxonomy.
//!
//! Only [`ReportError`] is visible to callers of the facade. Conversion and
//! render-time lookup problems are recovered inside the core: a failed
//! conversion skips its criterion, an unresolved reference renders a
//! placeholder cell. [`StoreError`] is the one failure that always crosses
//! the boundary, wrapped as [`ReportError::StoreUnavailable`].

use thiserror::Error;

/// Failure reported by a [`RecordStore`](crate::store::RecordStore).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("record store timed out after {0} ms")]
    Timeout(u64),
    #[error("record store returned corrupt data for {entity}: {detail}")]
    Corrupt { entity: String, detail: String },
}

/// Per-value conversion failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("invalid currency format: {0:?}")]
    InvalidCurrencyFormat(String),
    #[error("unknown lease term: {0:?}")]
    UnknownLeaseTerm(String),
    #[error("lookup {name:?} on {entity} matched {matches} records")]
    LookupNotResolved {
        entity: String,
        name: String,
        matches: usize,
    },
    /// The store failed while resolving a lookup. Never recovered locally.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Caller-visible failures of a report run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("malformed search term {raw:?}: {reason}")]
    MalformedSearchTerm { raw: String, reason: &'static str },
    #[error("no search criterion could use the term {term:?}")]
    NoMatchableCriteria { term: String },
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

/// Failure loading or validating a report profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to parse profile: {0}")]
    Parse(#[from] config::ConfigError),
    #[error("failed to read profile {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("criterion #{index}: unknown operator {name:?}")]
    UnknownOperator { index: usize, name: String },
    #[error("criterion #{index}: unknown conversion {name:?}")]
    UnknownConversion { index: usize, name: String },
    #[error("criterion #{index}: lookup conversion needs lookup_entity and lookup_name_field")]
    IncompleteLookup { index: usize },
    #[error("criterion #{index}: operator {operator} cannot be used with {conversion} conversion on {field}")]
    IncompatibleOperator {
        index: usize,
        field: String,
        operator: String,
        conversion: String,
    },
    #[error("column {attribute:?}: unknown special format {name:?}")]
    UnknownSpecialFormat { attribute: String, name: String },
    #[error("column {attribute:?}: hyperlink needs both link_entity and link_id_attribute")]
    IncompleteHyperlink { attribute: String },
    #[error("column {0:?} is defined more than once")]
    DuplicateColumn(String),
    #[error("lease term table repeats {0}")]
    DuplicateLeaseTerm(String),
    #[error("profile defines no columns")]
    NoColumns,
}

/// Failure resolving a configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("failed to write default configuration to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("setting {0:?} has no value and no default")]
    Missing(String),
    #[error("setting {name:?} value {value:?} is not valid: {reason}")]
    Invalid {
        name: String,
        value: String,
        reason: String,
    },
}
