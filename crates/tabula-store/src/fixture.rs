//! JSON fixture documents.
//!
//! ```json
//! {
//!   "entities": {
//!     "account": {
//!       "display_field": "name",
//!       "records": [
//!         { "id": "a1", "fields": { "name": { "text": "ACME Corp" } } }
//!       ]
//!     }
//!   }
//! }
//! ```
//!
//! Field values use the externally tagged [`FieldValue`] encoding. A `null`
//! field is treated as absent.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use tabula_core::{FieldValue, Record};
use thiserror::Error;

/// Failure loading a fixture document.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid fixture document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("entity {entity:?} lists record {id:?} more than once")]
    DuplicateRecord { entity: String, id: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    #[serde(default)]
    entities: BTreeMap<String, RawEntity>,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    #[serde(default)]
    display_field: Option<String>,
    #[serde(default)]
    records: Vec<RawRecord>,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    id: String,
    #[serde(default)]
    fields: HashMap<String, Option<FieldValue>>,
}

/// One entity type's records, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityTable {
    /// Field whose text is the record's display name.
    pub display_field: Option<String>,
    pub records: Vec<Record>,
}

/// Parse a fixture document into entity tables.
pub fn parse_document(src: &str) -> Result<BTreeMap<String, EntityTable>, FixtureError> {
    let raw: RawDocument = serde_json::from_str(src)?;
    let mut tables = BTreeMap::new();

    for (entity, raw_entity) in raw.entities {
        let mut records = Vec::with_capacity(raw_entity.records.len());
        for raw_record in raw_entity.records {
            if records.iter().any(|r: &Record| r.id == raw_record.id) {
                return Err(FixtureError::DuplicateRecord {
                    entity,
                    id: raw_record.id,
                });
            }
            let mut record = Record::new(entity.clone(), raw_record.id);
            record.fields = raw_record
                .fields
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name, v)))
                .collect();
            records.push(record);
        }
        tables.insert(
            entity,
            EntityTable {
                display_field: raw_entity.display_field,
                records,
            },
        );
    }
    Ok(tables)
}

/// Read and parse a fixture file.
pub fn read_document(path: &Path) -> Result<BTreeMap<String, EntityTable>, FixtureError> {
    let src = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_document(&src)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    const DOC: &str = r#"{
        "entities": {
            "workorder": {
                "records": [
                    { "id": "w1", "fields": {
                        "name": { "text": "Pump" },
                        "total_amount": { "number": "1500.00" },
                        "customer": { "reference": { "entity": "account", "id": "a1" } },
                        "description": null
                    } }
                ]
            },
            "account": { "display_field": "name", "records": [] }
        }
    }"#;

    #[test]
    fn parses_typed_fields_and_drops_nulls() {
        let tables = parse_document(DOC).unwrap();
        let wo = &tables["workorder"].records[0];
        assert_eq!(wo.entity, "workorder");
        assert_eq!(wo.fields.len(), 3);
        assert_eq!(
            wo.fields["total_amount"],
            FieldValue::Number(Decimal::new(150000, 2))
        );
        assert_eq!(
            wo.fields["customer"],
            FieldValue::reference("account", "a1")
        );
        assert_eq!(tables["account"].display_field.as_deref(), Some("name"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let doc = r#"{"entities":{"a":{"records":[{"id":"1"},{"id":"1"}]}}}"#;
        assert!(matches!(
            parse_document(doc),
            Err(FixtureError::DuplicateRecord { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_document(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, FixtureError::Io { .. }));
    }
}
