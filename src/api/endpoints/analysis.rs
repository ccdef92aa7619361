//! Biomarker analysis endpoints.
//!
//! `POST /api/analyze` classifies a JSON mapping, `POST /api/upload-pdf`
//! extracts the mapping from a lab report first, and `POST /api/export-pdf`
//! renders an analysis result as a downloadable report.

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analysis::{
    analyze as classify_readings, compose_message, BiomarkerInput, BiomarkerValue, RejectedEntry,
};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::extraction::{validate_pdf, ExtractionError};
use crate::models::{AnalysisRecord, AnalysisReport, AnalysisSummary};
use crate::report::render_analysis_pdf;

/// Multipart field carrying the uploaded report.
const UPLOAD_FIELD: &str = "file";

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub biomarkers: Map<String, Value>,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub status: &'static str,
    pub message: String,
    pub results: Vec<AnalysisRecord>,
    pub summary: AnalysisSummary,
    pub rejected: Vec<RejectedEntry>,
}

impl AnalyzeResponse {
    fn new(report: AnalysisReport, rejected: Vec<RejectedEntry>) -> Self {
        Self {
            status: "success",
            message: compose_message(&report.summary),
            results: report.results,
            summary: report.summary,
            rejected,
        }
    }
}

/// `POST /api/analyze`: classify submitted values against the catalog.
pub async fn analyze(
    State(ctx): State<ApiContext>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    if payload.biomarkers.is_empty() {
        return Err(ApiError::BadRequest("No biomarker provided".into()));
    }

    let input = BiomarkerInput::from_json_map(&payload.biomarkers);
    if input.is_empty() {
        let names: Vec<&str> = input.rejected.iter().map(|r| r.name.as_str()).collect();
        return Err(ApiError::BadRequest(format!(
            "No numeric biomarker value provided (rejected: {})",
            names.join(", ")
        )));
    }

    let report = run_analysis(&ctx, &input.readings)?;
    Ok(Json(AnalyzeResponse::new(report, input.rejected)))
}

/// `POST /api/upload-pdf`: extract values from a lab report and classify them.
pub async fn upload_pdf(
    State(ctx): State<ApiContext>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let extractor = ctx.core.extractor().ok_or(ExtractionError::NotConfigured)?;

    let pdf = read_upload(multipart).await?;
    validate_pdf(&pdf, ctx.core.config.pdf_max_size_mb)?;
    tracing::info!(size_bytes = pdf.len(), "Extracting biomarkers from uploaded PDF");

    let readings = tokio::task::spawn_blocking(move || extractor.extract(&pdf)).await??;
    tracing::info!(extracted = readings.len(), "PDF extraction complete");

    let report = run_analysis(&ctx, &readings)?;
    Ok(Json(AnalyzeResponse::new(report, Vec::new())))
}

/// `POST /api/export-pdf`: render a previous analysis result as a PDF.
///
/// Accepts the `AnalyzeResponse` shape; only `results` and `summary` are read.
pub async fn export_pdf(Json(report): Json<AnalysisReport>) -> Result<Response, ApiError> {
    let bytes = tokio::task::spawn_blocking(move || render_analysis_pdf(&report)).await??;

    let filename = format!(
        "gula_analysis_{}.pdf",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let disposition = HeaderValue::from_str(&format!("attachment; filename={filename}"))
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

fn run_analysis(
    ctx: &ApiContext,
    readings: &[(String, BiomarkerValue)],
) -> Result<AnalysisReport, ApiError> {
    let catalog = ctx.core.catalog()?;
    let report = classify_readings(readings, &*catalog);
    tracing::info!(
        total = report.summary.total(),
        normal = report.summary.normal,
        low = report.summary.low,
        high = report.summary.high,
        unknown = report.summary.unknown,
        "Analysis completed"
    );
    Ok(report)
}

async fn read_upload(mut multipart: Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(UPLOAD_FIELD) {
            if let Some(name) = field.file_name() {
                if !name.to_lowercase().ends_with(".pdf") {
                    return Err(ExtractionError::NotPdf.into());
                }
            }
            return field.bytes().await.map_err(multipart_error);
        }
    }
    Err(ApiError::BadRequest(format!(
        "Missing multipart field '{UPLOAD_FIELD}'"
    )))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}
