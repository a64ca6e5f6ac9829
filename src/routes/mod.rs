pub mod health_check; // Public for OpenAPI annotations
pub mod home; // Public for OpenAPI annotations
pub mod run; // Public for OpenAPI annotations

pub use health_check::*;
pub use home::*;
pub use run::*;

use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payment Simulator",
        description = "Drives simulated card payments through the sandbox gateway."
    ),
    tags(
        (name = "health", description = "Liveness endpoints"),
        (name = "simulation", description = "Manual simulation runs")
    ),
    paths(health_check::health_check, home::home, run::run)
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
