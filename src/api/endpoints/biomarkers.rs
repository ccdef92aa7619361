//! Reference catalog listing.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::ReferenceListing;

#[derive(Serialize)]
pub struct BiomarkerListResponse {
    pub status: &'static str,
    pub count: usize,
    pub biomarkers: Vec<ReferenceListing>,
}

/// `GET /api/biomarkers`: every reference entry, advice texts omitted.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<BiomarkerListResponse>, ApiError> {
    let catalog = ctx.core.catalog()?;
    let biomarkers: Vec<ReferenceListing> = catalog
        .sorted_entries()
        .into_iter()
        .map(ReferenceListing::from)
        .collect();

    Ok(Json(BiomarkerListResponse {
        status: "success",
        count: biomarkers.len(),
        biomarkers,
    }))
}
