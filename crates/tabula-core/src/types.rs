//! Core types for tabula-core.
//!
//! This module defines the data structures shared across every layer: the
//! typed [`FieldValue`], the [`Record`] it lives in, the ordered [`RecordSet`]
//! produced by a search, the [`RenderedReport`] artifact pair, and the
//! normalised [`LanguageTag`].

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A typed field value stored on a record.
///
/// Absence is modelled by the field key being missing from
/// [`Record::fields`]; there is no null variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Number(Decimal),
    Date(chrono::DateTime<chrono::Utc>),
    Bool(bool),
    /// Pointer to another record, displayed by that record's name.
    Reference { entity: String, id: String },
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn reference(entity: impl Into<String>, id: impl Into<String>) -> Self {
        FieldValue::Reference {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// The text payload, if this is a [`FieldValue::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Short kind name used in log events and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Number(_) => "number",
            FieldValue::Date(_) => "date",
            FieldValue::Bool(_) => "bool",
            FieldValue::Reference { .. } => "reference",
        }
    }
}

impl std::fmt::Display for FieldValue {
    /// Language-neutral display form. Booleans and references are localised
    /// or resolved by the renderer before this is ever reached for them.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Number(n) => write!(f, "{}", n.normalize()),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Reference { entity, id } => write!(f, "{entity}:{id}"),
        }
    }
}

/// One record returned by the store.
///
/// Identity is the `(entity, id)` pair; two records of different entity types
/// may share an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Record kind, e.g. `workorder`.
    pub entity: String,
    /// Primary identifier, unique within `entity`.
    pub id: String,
    /// Populated fields. Keys are attribute names.
    #[serde(default)]
    pub fields: HashMap<String, FieldValue>,
}

impl Record {
    pub fn new(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            id: id.into(),
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Look up an attribute. `id` falls back to the record identifier when the
    /// store did not populate it as a field.
    pub fn get(&self, attribute: &str) -> Option<FieldValue> {
        match self.fields.get(attribute) {
            Some(v) => Some(v.clone()),
            None if attribute == "id" => Some(FieldValue::Text(self.id.clone())),
            None => None,
        }
    }

    /// The `(entity, id)` identity key.
    pub fn identity(&self) -> (&str, &str) {
        (&self.entity, &self.id)
    }
}

/// Ordered result of a search. Order is the search-determined order and is
/// never changed by rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    records: Vec<Record>,
    /// Set when a record cap cut the union short.
    pub truncated: bool,
}

impl RecordSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            truncated: false,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Keep at most `max` records, flagging the set as truncated if any were
    /// dropped.
    pub fn cap(&mut self, max: usize) {
        if self.records.len() > max {
            self.records.truncate(max);
            self.truncated = true;
        }
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// The two-part rendered artifact returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedReport {
    /// The `<table>` markup: one header row, one body row per record.
    pub table_markup: String,
    /// Count banner plus client-side bootstrap snippet.
    pub auxiliary_markup: String,
}

/// A normalised language tag such as `en` or `fr-ca`.
///
/// Normalisation lowercases and replaces `_` with `-`, so `fr_CA`, `FR-ca` and
/// `fr-CA` all compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageTag(String);

impl LanguageTag {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_lowercase().replace('_', "-"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The primary language subtag (`fr` for `fr-ca`).
    pub fn primary(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decimal and grouping separators conventionally used by this language.
    pub fn number_format(&self) -> NumberFormat {
        match self.primary() {
            "fr" => NumberFormat {
                decimal: ',',
                group: '\u{a0}',
            },
            "de" | "es" | "it" | "nl" | "pt" => NumberFormat {
                decimal: ',',
                group: '.',
            },
            _ => NumberFormat {
                decimal: '.',
                group: ',',
            },
        }
    }
}

impl std::fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LanguageTag {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Decimal and digit-grouping separators for a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    pub decimal: char,
    pub group: char,
}
