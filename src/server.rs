//! HTTP transport for reports.
//!
//! `GET /report?q=term|lang` answers with the rendered report as JSON:
//!
//! | outcome                         | status | body                                       |
//! |---------------------------------|--------|--------------------------------------------|
//! | report rendered                 | 200    | `{tableMarkup, auxiliaryMarkup}`           |
//! | no criterion could use the term | 200    | empty report + `warning: "no_matchable_criteria"` |
//! | malformed `q`                   | 400    | `{error}`                                  |
//! | record store failure            | 503    | `{error}`                                  |
//!
//! The core is synchronous, so each request runs on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabula_core::search::CompoundTerm;
use tabula_core::{RecordStore, RenderedReport, ReportError, ReportFacade};
use tokio::net::TcpListener;

pub const NO_MATCHABLE_CRITERIA: &str = "no_matchable_criteria";

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct ReportBody {
    #[serde(flatten)]
    pub report: RenderedReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

/// Build the router serving `facade`.
pub fn router<S>(facade: Arc<ReportFacade<S>>) -> Router
where
    S: RecordStore + 'static,
{
    Router::new()
        .route("/report", get(report::<S>))
        .with_state(facade)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve<S>(facade: Arc<ReportFacade<S>>, addr: &str) -> anyhow::Result<()>
where
    S: RecordStore + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "serving reports");
    axum::serve(listener, router(facade)).await?;
    Ok(())
}

async fn report<S>(State(facade): State<Arc<ReportFacade<S>>>, Query(params): Query<ReportParams>) -> Response
where
    S: RecordStore + 'static,
{
    let raw = params.q;
    let outcome = tokio::task::spawn_blocking(move || respond(&facade, &raw)).await;

    match outcome {
        Ok(Ok(body)) => (StatusCode::OK, Json(body)).into_response(),
        Ok(Err(err)) => {
            let status = status_for(&err);
            tracing::warn!(%status, %err, "report request failed");
            (status, Json(json!({ "error": err.to_string() }))).into_response()
        }
        Err(join) => {
            tracing::error!(%join, "report task panicked");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error" })),
            )
                .into_response()
        }
    }
}

/// Run one request against the facade. Unmatchable terms become an empty
/// report with a warning.
pub fn respond<S: RecordStore>(facade: &ReportFacade<S>, raw: &str) -> Result<ReportBody, ReportError> {
    let compound = CompoundTerm::parse(raw)?;
    match facade.run_term(&compound.term, &compound.lang) {
        Ok(report) => Ok(ReportBody { report, warning: None }),
        Err(ReportError::NoMatchableCriteria { term }) => {
            tracing::info!(%term, "no criterion matched, returning empty report");
            Ok(ReportBody {
                report: facade.empty_report(&compound.lang)?,
                warning: Some(NO_MATCHABLE_CRITERIA),
            })
        }
        Err(err) => Err(err),
    }
}

fn status_for(err: &ReportError) -> StatusCode {
    match err {
        ReportError::MalformedSearchTerm { .. } => StatusCode::BAD_REQUEST,
        ReportError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ReportError::NoMatchableCriteria { .. } => StatusCode::OK,
    }
}
