#![allow(unused)]
//! HTTP transport harness.
//!
//! # What this covers
//!
//! - **Success**: `GET /report?q=term|lang` returns 200 with
//!   `tableMarkup` and `auxiliaryMarkup`.
//! - **Status mapping**: malformed `q` is 400, a failing record store is 503.
//! - **Unmatchable terms**: 200 with the empty report and a
//!   `no_matchable_criteria` warning.
//!
//! Requests go straight into the router with `tower::ServiceExt::oneshot`;
//! no socket is opened.
//!
//! # What this does NOT cover
//!
//! - `server::serve` binding a real listener
//!
//! # Running
//!
//! ```sh
//! cargo test --test serve_harness
//! ```

mod common;
use common::*;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tabula::server::{self, NO_MATCHABLE_CRITERIA};
use tabula_core::profile::{ColumnDefinition, ConversionKind};
use tabula_core::store::Operator;
use tabula_core::{RecordStore, ReportError, ReportFacade};
use tower::ServiceExt;

async fn get<S: RecordStore + 'static>(facade: ReportFacade<S>, uri: &str) -> (StatusCode, Value) {
    let response = server::router(Arc::new(facade))
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn currency_only() -> ReportFacade<tabula_store::MemoryStore> {
    let profile = ProfileBuilder::new()
        .criterion(Operator::Equal, "total_amount", "workorder", ConversionKind::CurrencyToNumber)
        .column(ColumnDefinition::plain("name", "Name").localized("fr", "Nom"))
        .shared();
    ReportFacade::new(profile, workorder_store())
}

#[tokio::test]
async fn report_is_served_as_json() {
    let facade = ReportFacade::new(name_search_profile(), workorder_store());
    let (status, body) = get(facade, "/report?q=ACME%7Cen").await;

    assert_eq!(status, StatusCode::OK);
    let table = body["tableMarkup"].as_str().unwrap();
    assert_eq!(row_ids(table), vec!["w1".to_string(), "w3".to_string()]);
    assert!(body["auxiliaryMarkup"].as_str().unwrap().contains("2 results"));
    assert!(body.get("warning").is_none());
}

#[tokio::test]
async fn french_request_gets_french_markup() {
    let facade = ReportFacade::new(name_search_profile(), workorder_store());
    let (status, body) = get(facade, "/report?q=ACME%7Cfr").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["auxiliaryMarkup"].as_str().unwrap().contains("2 résultats"));
}

#[tokio::test]
async fn malformed_query_is_bad_request() {
    for uri in ["/report?q=ACME", "/report", "/report?q=a%7Cb%7Cc"] {
        let facade = ReportFacade::new(name_search_profile(), workorder_store());
        let (status, body) = get(facade, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].as_str().is_some());
    }
}

#[tokio::test]
async fn failing_store_is_service_unavailable() {
    let facade = ReportFacade::new(name_search_profile(), FailingStore::down());
    let (status, body) = get(facade, "/report?q=ACME%7Cen").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn unmatchable_term_returns_empty_report_with_warning() {
    let (status, body) = get(currency_only(), "/report?q=ACME%7Cfr").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["warning"], NO_MATCHABLE_CRITERIA);
    let table = body["tableMarkup"].as_str().unwrap();
    assert!(row_ids(table).is_empty());
    assert_eq!(header_cells(table), vec!["Nom".to_string()]);
}

#[test]
fn respond_without_http() {
    let facade = currency_only();

    let ok = server::respond(&facade, "1500|en").unwrap();
    assert_eq!(ok.warning, None);
    assert_rows!(ok.report, ["w1", "w3"]);

    let warned = server::respond(&facade, "ACME|en").unwrap();
    assert_eq!(warned.warning, Some(NO_MATCHABLE_CRITERIA));
    assert_summary!(warned.report, 0, "0 results");

    assert!(matches!(
        server::respond(&facade, "ACME"),
        Err(ReportError::MalformedSearchTerm { .. })
    ));
}
