//! The narrow retrieval capability the core consumes.
//!
//! The core never persists records. It builds [`EntityQuery`] values and hands
//! them to a [`RecordStore`], which executes them against whatever backend the
//! host provides. Calls are blocking and issued sequentially.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::types::{FieldValue, Record};

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// Comparison operator of a single field condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equal,
    NotEqual,
    /// SQL-style pattern: `%` matches any run, `_` one character, and `\`
    /// makes the next character literal.
    Like,
    NotLike,
    BeginsWith,
    EndsWith,
    In,
    NotIn,
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,
}

impl Operator {
    pub const ALL: [Operator; 12] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::Like,
        Operator::NotLike,
        Operator::BeginsWith,
        Operator::EndsWith,
        Operator::In,
        Operator::NotIn,
        Operator::GreaterThan,
        Operator::GreaterEqual,
        Operator::LessThan,
        Operator::LessEqual,
    ];

    /// Profile spelling of the operator.
    pub fn name(self) -> &'static str {
        match self {
            Operator::Equal => "equal",
            Operator::NotEqual => "not_equal",
            Operator::Like => "like",
            Operator::NotLike => "not_like",
            Operator::BeginsWith => "begins_with",
            Operator::EndsWith => "ends_with",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::GreaterThan => "greater_than",
            Operator::GreaterEqual => "greater_equal",
            Operator::LessThan => "less_than",
            Operator::LessEqual => "less_equal",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let wanted = name.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL.into_iter().find(|op| op.name() == wanted)
    }

    /// `Equal`, `NotEqual`, `In`, `NotIn`.
    pub fn is_equality_class(self) -> bool {
        matches!(
            self,
            Operator::Equal | Operator::NotEqual | Operator::In | Operator::NotIn
        )
    }

    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Operator::GreaterThan | Operator::GreaterEqual | Operator::LessThan | Operator::LessEqual
        )
    }

    /// Operators whose value is a text pattern rather than a typed value.
    pub fn is_pattern(self) -> bool {
        matches!(
            self,
            Operator::Like | Operator::NotLike | Operator::BeginsWith | Operator::EndsWith
        )
    }

    pub fn is_set(self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionValue {
    Single(FieldValue),
    /// Value list for `In` / `NotIn`.
    Many(Vec<FieldValue>),
}

/// One field condition against a single entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: ConditionValue,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: ConditionValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    pub fn single(field: impl Into<String>, operator: Operator, value: FieldValue) -> Self {
        Self::new(field, operator, ConditionValue::Single(value))
    }
}

/// How the conditions of one [`EntityQuery`] combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combine {
    #[default]
    Or,
    And,
}

/// A query against one record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityQuery {
    pub entity: String,
    pub conditions: Vec<Condition>,
    pub combine: Combine,
    /// Fields to populate on returned records. Empty means all fields.
    pub columns: Vec<String>,
}

impl EntityQuery {
    pub fn new(entity: impl Into<String>, combine: Combine) -> Self {
        Self {
            entity: entity.into(),
            conditions: Vec::new(),
            combine,
            columns: Vec::new(),
        }
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }
}

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------

/// Retrieval collaborator implemented outside the core.
///
/// Implementations are responsible for isolation between concurrent callers.
/// Any error is fatal to the report run that triggered it.
pub trait RecordStore: Send + Sync {
    /// Execute `query` and return matching records in the store's order.
    fn query(&self, query: &EntityQuery) -> Result<Vec<Record>, StoreError>;

    /// Resolve a reference identifier to a human-readable label. `Ok(None)`
    /// means the record does not exist or has no label.
    fn resolve_display_name(&self, entity: &str, id: &str) -> Result<Option<String>, StoreError>;
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn query(&self, query: &EntityQuery) -> Result<Vec<Record>, StoreError> {
        (**self).query(query)
    }

    fn resolve_display_name(&self, entity: &str, id: &str) -> Result<Option<String>, StoreError> {
        (**self).resolve_display_name(entity, id)
    }
}

impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    fn query(&self, query: &EntityQuery) -> Result<Vec<Record>, StoreError> {
        (**self).query(query)
    }

    fn resolve_display_name(&self, entity: &str, id: &str) -> Result<Option<String>, StoreError> {
        (**self).resolve_display_name(entity, id)
    }
}

impl<T: RecordStore + ?Sized> RecordStore for Box<T> {
    fn query(&self, query: &EntityQuery) -> Result<Vec<Record>, StoreError> {
        (**self).query(query)
    }

    fn resolve_display_name(&self, entity: &str, id: &str) -> Result<Option<String>, StoreError> {
        (**self).resolve_display_name(entity, id)
    }
}
