//! Canned record documents and profiles shared by the harnesses.

use std::sync::Arc;

use tabula_core::profile::ColumnDefinition;
use tabula_core::ReportProfile;
use tabula_store::MemoryStore;

use super::builders::ProfileBuilder;

/// Accounts plus four work orders.
///
/// | id | name               | customer        | lease     | amount  |
/// |----|--------------------|-----------------|-----------|---------|
/// | w1 | ACME pump overhaul | a1 (ACME Corp)  | 36 months | 1500.00 |
/// | w2 | Globex chiller     | a2 (Globex)     | 12 months | 250     |
/// | w3 | ACME valve         | a9 (dangling)   |           | 1500    |
/// | w4 | Boiler check       | a1 (ACME Corp)  | 60 months |         |
pub const WORKORDER_FIXTURE: &str = r#"{
  "entities": {
    "account": {
      "display_field": "name",
      "records": [
        { "id": "a1", "fields": { "name": { "text": "ACME Corp" } } },
        { "id": "a2", "fields": { "name": { "text": "Globex" } } }
      ]
    },
    "workorder": {
      "records": [
        { "id": "w1", "fields": {
            "name": { "text": "ACME pump overhaul" },
            "customer": { "reference": { "entity": "account", "id": "a1" } },
            "lease_term": { "number": "100000002" },
            "total_amount": { "number": "1500.00" },
            "status": { "text": "Open" },
            "description": { "text": "Replace <seal> & gasket" },
            "created_on": { "date": "2024-03-01T00:00:00Z" },
            "owner_key": { "text": "u1" }
        } },
        { "id": "w2", "fields": {
            "name": { "text": "Globex chiller" },
            "customer": { "reference": { "entity": "account", "id": "a2" } },
            "lease_term": { "number": "100000000" },
            "total_amount": { "number": "250" },
            "status": { "text": "Closed" },
            "description": null
        } },
        { "id": "w3", "fields": {
            "name": { "text": "ACME valve" },
            "customer": { "reference": { "entity": "account", "id": "a9" } },
            "total_amount": { "number": "1500" },
            "status": { "text": "Open" }
        } },
        { "id": "w4", "fields": {
            "name": { "text": "Boiler check" },
            "customer": { "reference": { "entity": "account", "id": "a1" } },
            "lease_term": { "number": "100000004" },
            "status": { "text": "Open" }
        } }
      ]
    },
    "quote": {
      "records": [
        { "id": "q1", "fields": { "name": { "text": "ACME quote" }, "status": { "text": "Draft" } } },
        { "id": "w1", "fields": { "name": { "text": "ACME re-quote" }, "status": { "text": "Draft" } } }
      ]
    }
  }
}"#;

pub fn workorder_store() -> MemoryStore {
    MemoryStore::from_json_str(WORKORDER_FIXTURE).expect("workorder fixture must parse")
}

/// The embedded default profile.
pub fn default_profile() -> Arc<ReportProfile> {
    Arc::new(ReportProfile::load_default())
}

/// One `Like` criterion on `workorder.name`, with a selection column, a
/// linked name column and a plain status column.
pub fn name_search_profile() -> Arc<ReportProfile> {
    ProfileBuilder::new()
        .like("name", "workorder")
        .column(ColumnDefinition::selection("select", "Select"))
        .column(
            ColumnDefinition::hyperlink("name", "Work order", "workorder", "id")
                .localized("fr", "Bon de travail"),
        )
        .column(ColumnDefinition::plain("status", "Status").localized("fr", "Statut"))
        .shared()
}
