//! Liveness endpoints.

use axum::Json;
use serde::Serialize;

use crate::config::{APP_NAME, APP_VERSION};

#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `GET /`: service banner.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: format!("{APP_NAME} API - blood test analysis"),
        status: "online",
        version: APP_VERSION,
    })
}

/// `GET /health`
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}
