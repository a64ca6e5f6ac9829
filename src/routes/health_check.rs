use axum::Json;

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Health check endpoint
///
/// Returns 200 OK as long as the process is serving requests, whatever
/// the state of the simulation runs.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}
