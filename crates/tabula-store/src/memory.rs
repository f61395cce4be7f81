//! In-memory [`RecordStore`] backed by entity tables.
//!
//! Matching rules:
//! - text comparisons are case-insensitive;
//! - `Like` patterns use `%` (any run) and `_` (one character);
//! - ordering compares numbers, dates or text, and never matches across kinds;
//! - references are equal when both entity and id match, and match text
//!   patterns through their display name;
//! - a field absent on the record never matches, including negated operators.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use tabula_core::store::{Combine, Condition, ConditionValue, EntityQuery, Operator};
use tabula_core::{FieldValue, Record, RecordStore, StoreError};

use crate::fixture::{self, EntityTable, FixtureError};

/// Records grouped by entity type, insertion-ordered within each type.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<BTreeMap<String, EntityTable>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON fixture document.
    pub fn from_json_str(src: &str) -> Result<Self, FixtureError> {
        Ok(Self {
            tables: RwLock::new(fixture::parse_document(src)?),
        })
    }

    /// Build from a JSON fixture file.
    pub fn from_path(path: &Path) -> Result<Self, FixtureError> {
        let tables = fixture::read_document(path)?;
        tracing::info!(
            path = %path.display(),
            entities = tables.len(),
            records = tables.values().map(|t| t.records.len()).sum::<usize>(),
            "fixture loaded"
        );
        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    /// Set the field used as display name for `entity`.
    pub fn set_display_field(&self, entity: &str, field: &str) {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables.entry(entity.to_string()).or_default().display_field = Some(field.to_string());
    }

    /// Insert `record`, replacing any record with the same identity in place.
    pub fn insert(&self, record: Record) {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let table = tables.entry(record.entity.clone()).or_default();
        match table.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => table.records.push(record),
        }
    }

    /// Total number of records across all entity types.
    pub fn len(&self) -> usize {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.values().map(|t| t.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryStore {
    fn query(&self, query: &EntityQuery) -> Result<Vec<Record>, StoreError> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let Some(table) = tables.get(&query.entity) else {
            tracing::debug!(entity = %query.entity, "query on unknown entity");
            return Ok(Vec::new());
        };

        let matcher = Matcher { tables: &tables };
        let rows = table
            .records
            .iter()
            .filter(|record| matcher.matches(record, query))
            .map(|record| project(record, &query.columns))
            .collect();
        Ok(rows)
    }

    fn resolve_display_name(&self, entity: &str, id: &str) -> Result<Option<String>, StoreError> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(display_name(&tables, entity, id))
    }
}

fn display_name(tables: &BTreeMap<String, EntityTable>, entity: &str, id: &str) -> Option<String> {
    let table = tables.get(entity)?;
    let field = table.display_field.as_deref()?;
    let record = table.records.iter().find(|r| r.id == id)?;
    match record.fields.get(field)? {
        FieldValue::Text(name) if !name.is_empty() => Some(name.clone()),
        FieldValue::Text(_) | FieldValue::Reference { .. } => None,
        other => Some(other.to_string()),
    }
}

fn project(record: &Record, columns: &[String]) -> Record {
    if columns.is_empty() {
        return record.clone();
    }
    let mut projected = Record::new(record.entity.clone(), record.id.clone());
    projected.fields = record
        .fields
        .iter()
        .filter(|(name, _)| columns.contains(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    projected
}

// ---------------------------------------------------------------------------
// Condition evaluation
// ---------------------------------------------------------------------------

struct Matcher<'t> {
    tables: &'t BTreeMap<String, EntityTable>,
}

impl Matcher<'_> {
    fn matches(&self, record: &Record, query: &EntityQuery) -> bool {
        if query.conditions.is_empty() {
            return true;
        }
        let mut results = query.conditions.iter().map(|c| self.condition(record, c));
        match query.combine {
            Combine::Or => results.any(|m| m),
            Combine::And => results.all(|m| m),
        }
    }

    fn condition(&self, record: &Record, condition: &Condition) -> bool {
        let Some(field) = record.get(&condition.field) else {
            return false;
        };
        let values: &[FieldValue] = match &condition.value {
            ConditionValue::Single(v) => std::slice::from_ref(v),
            ConditionValue::Many(vs) => vs,
        };

        match condition.operator {
            Operator::Equal | Operator::In => values.iter().any(|v| equal(&field, v)),
            Operator::NotEqual | Operator::NotIn => !values.iter().any(|v| equal(&field, v)),
            Operator::Like => self.text_test(&field, values, like),
            Operator::NotLike => !self.text_test(&field, values, like),
            Operator::BeginsWith => self.text_test(&field, values, |text, p| text.starts_with(p)),
            Operator::EndsWith => self.text_test(&field, values, |text, p| text.ends_with(p)),
            Operator::GreaterThan => ordered(&field, values, |o| o == Ordering::Greater),
            Operator::GreaterEqual => ordered(&field, values, |o| o != Ordering::Less),
            Operator::LessThan => ordered(&field, values, |o| o == Ordering::Less),
            Operator::LessEqual => ordered(&field, values, |o| o != Ordering::Greater),
        }
    }

    /// Apply a lowercase text predicate to the field's text form.
    fn text_test(&self, field: &FieldValue, patterns: &[FieldValue], test: impl Fn(&str, &str) -> bool) -> bool {
        let text = match field {
            FieldValue::Reference { entity, id } => match display_name(self.tables, entity, id) {
                Some(name) => name,
                None => return false,
            },
            other => other.to_string(),
        }
        .to_lowercase();
        patterns
            .iter()
            .any(|p| test(&text, &p.to_string().to_lowercase()))
    }
}

fn equal(field: &FieldValue, value: &FieldValue) -> bool {
    match (field, value) {
        (FieldValue::Text(a), FieldValue::Text(b)) => a.to_lowercase() == b.to_lowercase(),
        (FieldValue::Number(a), FieldValue::Number(b)) => a == b,
        (FieldValue::Date(a), FieldValue::Date(b)) => a == b,
        (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
        (
            FieldValue::Reference { entity: ea, id: ia },
            FieldValue::Reference { entity: eb, id: ib },
        ) => ea == eb && ia == ib,
        _ => false,
    }
}

fn ordered(field: &FieldValue, values: &[FieldValue], accept: impl Fn(Ordering) -> bool) -> bool {
    values.iter().any(|value| {
        let ordering = match (field, value) {
            (FieldValue::Number(a), FieldValue::Number(b)) => Some(a.cmp(b)),
            (FieldValue::Date(a), FieldValue::Date(b)) => Some(a.cmp(b)),
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.to_lowercase().cmp(&b.to_lowercase())),
            _ => None,
        };
        ordering.is_some_and(&accept)
    })
}

/// One element of a compiled `LIKE` pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    AnyRun,
    AnyOne,
    Char(char),
}

/// Split a pattern into tokens; `\` makes the next character literal and a
/// trailing `\` matches itself.
fn tokens(pattern: &str) -> Vec<Token> {
    let mut out = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        out.push(match ch {
            '%' => Token::AnyRun,
            '_' => Token::AnyOne,
            '\\' => Token::Char(chars.next().unwrap_or('\\')),
            c => Token::Char(c),
        });
    }
    out
}

/// SQL-style `LIKE`: `%` matches any run, `_` exactly one character.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern = tokens(pattern);
    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(Token::AnyRun) => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(Token::AnyOne) => {
                t += 1;
                p += 1;
            }
            Some(Token::Char(c)) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match backtrack {
                Some((bp, bt)) => {
                    p = bp + 1;
                    t = bt + 1;
                    backtrack = Some((bp, bt + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|tok| *tok == Token::AnyRun)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
