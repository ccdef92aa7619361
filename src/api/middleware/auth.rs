//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, verifies the JWT, checks the
//! account still exists and is active, and injects `AuthenticatedUser`
//! into request extensions for downstream handlers.

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthenticatedUser};
use crate::db;

/// Require a valid access token.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
/// On success: injects `AuthenticatedUser` and adds `Cache-Control: no-store`.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    let claims = ctx.core.jwt().verify(&token)?;
    let user_id = claims.user_id()?;

    // Tokens outlive deleted or deactivated accounts
    let user = {
        let conn = ctx.core.open_db()?;
        db::get_user_by_id(&conn, &user_id)?
    };
    let user = match user {
        Some(user) if user.is_active => user,
        Some(_) => {
            tracing::warn!(%user_id, "Token presented for inactive account");
            return Err(ApiError::Unauthorized);
        }
        None => return Err(ApiError::Unauthorized),
    };

    req.extensions_mut().insert(AuthenticatedUser {
        user_id: user.id,
        email: user.email,
    });

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));

    Ok(response)
}
