use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use uuid::Uuid;

use crate::run_executor::{IterationFailure, RunReport};
use crate::startup::AppState;
use crate::utils::{ErrorBody, e400, e500};

/// How many iterations to run. Accepted both in the query string and in
/// a JSON body; the query string wins when both are present.
#[derive(Debug, Default, serde::Deserialize, utoipa::IntoParams, utoipa::ToSchema)]
#[into_params(parameter_in = Query)]
pub struct RunParameters {
    /// Number of pipeline iterations. Missing or 0 means the configured default
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub iterations: Option<u32>,
}

impl RunParameters {
    fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
    }
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct RunResponse {
    /// `ok` if every iteration succeeded, `error` otherwise
    pub status: String,
    pub run_id: Uuid,
    pub iterations: u32,
    pub succeeded: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<IterationFailure>,
}

impl From<RunReport> for RunResponse {
    fn from(report: RunReport) -> Self {
        let status = if report.is_success() { "ok" } else { "error" };
        Self {
            status: status.to_string(),
            run_id: report.run_id,
            iterations: report.attempted,
            succeeded: report.succeeded,
            failures: report.failures,
        }
    }
}

/// Trigger a simulation run now
///
/// Runs the payment pipeline synchronously and answers once the run is
/// over. Runs started here are independent from the scheduled ones.
#[utoipa::path(
    post,
    path = "/run",
    tag = "simulation",
    params(RunParameters),
    request_body(
        content = RunParameters,
        content_type = "application/json",
        description = "Optional, may be left empty"
    ),
    responses(
        (status = 200, description = "Every iteration succeeded", body = RunResponse),
        (status = 400, description = "The query string or the body is malformed", body = ErrorBody),
        (status = 500, description = "At least one iteration failed", body = RunResponse),
    )
)]
#[tracing::instrument(
    name = "Manual simulation run",
    skip_all,
    fields(iterations = tracing::field::Empty)
)]
pub async fn run(
    State(state): State<AppState>,
    query: Result<Query<RunParameters>, QueryRejection>,
    body: Bytes,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(e) => return e400(e),
    };
    let body = match RunParameters::from_body(&body) {
        Ok(body) => body,
        Err(e) => return e400(e),
    };
    let iterations = query
        .iterations
        .or(body.iterations)
        .filter(|n| *n > 0)
        .unwrap_or(state.default_iterations);
    tracing::Span::current().record("iterations", iterations);
    tracing::info!(
        triggered_at = %chrono::Utc::now().to_rfc3339(),
        "Manual run triggered"
    );

    match state.runner.run_once(iterations).await {
        Ok(report) => {
            let status = if report.is_success() {
                StatusCode::OK
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(RunResponse::from(report))).into_response()
        }
        Err(e) => e500(e),
    }
}
