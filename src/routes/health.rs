use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
}

/// GET / - public
pub async fn root() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "HomeHero API is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/health - public
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "Server is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}
