use axum::Json;

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = StatusResponse)
    )
)]
pub async fn home() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running".to_string(),
    })
}
