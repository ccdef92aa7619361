//! HTTP API router.
//!
//! Returns a composable `Router` that can be served by any axum server.
//!
//! Middleware stack (outermost → innermost):
//! CORS → Extension(ApiContext) → Auth validator (protected routes only) → Audit logger

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Multipart framing overhead accepted on top of the PDF size limit.
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected outside the route layers).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    let upload_limit = usize::try_from(ctx.core.config.pdf_max_size_mb)
        .unwrap_or(usize::MAX)
        .saturating_mul(1024 * 1024)
        .saturating_add(UPLOAD_OVERHEAD_BYTES);

    // Public routes: analysis, catalog, account creation and sign-in
    let public = Router::new()
        .route("/", get(endpoints::health::root))
        .route("/health", get(endpoints::health::check))
        .route("/api/analyze", post(endpoints::analysis::analyze))
        .route("/api/biomarkers", get(endpoints::biomarkers::list))
        .route("/api/export-pdf", post(endpoints::analysis::export_pdf))
        .route(
            "/api/upload-pdf",
            post(endpoints::analysis::upload_pdf).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/auth/register", post(endpoints::auth::register))
        .route("/auth/login", post(endpoints::auth::login))
        .route("/auth/google/login", get(endpoints::auth::google_login))
        .route("/auth/google/callback", get(endpoints::auth::google_callback))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::Extension(ctx.clone()));

    // Protected routes: bearer token required
    //
    // Layers are applied from bottom (innermost) to top (outermost):
    //   Extension (outermost) → Auth → Audit (innermost) → Handler
    // Auth and audit are route layers so unmatched paths still fall through to 404.
    let protected = Router::new()
        .route("/auth/users/me", get(endpoints::auth::me))
        .route(
            "/api/profile/me",
            get(endpoints::profile::get)
                .post(endpoints::profile::create)
                .put(endpoints::profile::update)
                .delete(endpoints::profile::delete),
        )
        .with_state(ctx.clone())
        .route_layer(axum::middleware::from_fn(middleware::audit::log_access))
        .route_layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors_layer(&ctx.core.config.allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
