//! Test builders: ergonomic constructors for records and report profiles.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use tabula_core::profile::{
    ColumnDefinition, ColumnRegistry, ConversionKind, CriterionRegistry, LeaseTerm, LeaseTermTable,
    SearchCriterionDefinition,
};
use tabula_core::store::Operator;
use tabula_core::{FieldValue, Record, ReportProfile};

// ---------------------------------------------------------------------------
// RecordBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Record`] fixtures.
///
/// # Example
///
/// ```rust
/// let wo = RecordBuilder::new("workorder", "w1")
///     .text("name", "ACME pump")
///     .number("total_amount", "1500.00")
///     .reference("customer", "account", "a1")
///     .build();
/// ```
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    pub fn new(entity: &str, id: &str) -> Self {
        Self {
            record: Record::new(entity, id),
        }
    }

    pub fn text(mut self, field: &str, value: &str) -> Self {
        self.record.fields.insert(field.to_string(), FieldValue::text(value));
        self
    }

    /// Decimal literal, e.g. `"1500.00"`.
    pub fn number(mut self, field: &str, value: &str) -> Self {
        let n = Decimal::from_str(value).expect("number fixture must be a decimal literal");
        self.record.fields.insert(field.to_string(), FieldValue::Number(n));
        self
    }

    /// RFC 3339 timestamp, e.g. `"2024-03-01T00:00:00Z"`.
    pub fn date(mut self, field: &str, value: &str) -> Self {
        let d = chrono::DateTime::parse_from_rfc3339(value)
            .expect("date fixture must be RFC 3339")
            .with_timezone(&chrono::Utc);
        self.record.fields.insert(field.to_string(), FieldValue::Date(d));
        self
    }

    pub fn flag(mut self, field: &str, value: bool) -> Self {
        self.record.fields.insert(field.to_string(), FieldValue::Bool(value));
        self
    }

    pub fn reference(mut self, field: &str, entity: &str, id: &str) -> Self {
        self.record
            .fields
            .insert(field.to_string(), FieldValue::reference(entity, id));
        self
    }

    pub fn build(self) -> Record {
        self.record
    }
}

// ---------------------------------------------------------------------------
// ProfileBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`ReportProfile`] fixtures.
#[derive(Default)]
pub struct ProfileBuilder {
    criteria: Vec<SearchCriterionDefinition>,
    columns: Vec<ColumnDefinition>,
    lease_terms: Vec<LeaseTerm>,
    link_template: Option<String>,
}

impl ProfileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn criterion(mut self, operator: Operator, field: &str, entity: &str, conversion: ConversionKind) -> Self {
        self.criteria
            .push(SearchCriterionDefinition::new(operator, field, entity, conversion));
        self
    }

    /// Shorthand for a `Like` criterion with no conversion.
    pub fn like(self, field: &str, entity: &str) -> Self {
        self.criterion(Operator::Like, field, entity, ConversionKind::None)
    }

    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    pub fn lease(mut self, code: i64, months: u32) -> Self {
        self.lease_terms.push(
            LeaseTerm::new(code, months)
                .label("en", &format!("{months} months"))
                .label("fr", &format!("{months} mois")),
        );
        self
    }

    pub fn link_template(mut self, template: &str) -> Self {
        self.link_template = Some(template.to_string());
        self
    }

    pub fn build(self) -> ReportProfile {
        let profile = ReportProfile::new(
            CriterionRegistry::new(self.criteria).expect("criteria fixture must validate"),
            ColumnRegistry::new(self.columns).expect("column fixture must validate"),
            LeaseTermTable::new(self.lease_terms).expect("lease fixture must validate"),
        );
        match self.link_template {
            Some(t) => profile.with_link_template(&t),
            None => profile,
        }
    }

    pub fn shared(self) -> Arc<ReportProfile> {
        Arc::new(self.build())
    }
}
