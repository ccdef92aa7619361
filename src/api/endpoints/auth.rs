//! Account endpoints: registration, password login, current user and
//! Google sign-in.
//!
//! `POST /auth/register`, `POST /auth/login`: unprotected
//! `GET /auth/users/me`: bearer token required
//! `GET /auth/google/login`, `GET /auth/google/callback`: browser redirects

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthenticatedUser};
use crate::auth::{self, AuthError};
use crate::db;
use crate::models::UserView;

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserView,
}

#[derive(Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// `POST /auth/register`: create a password account.
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let core = ctx.core.clone();
    let user = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let conn = core.open_db()?;
        auth::register_user(&conn, core.hasher(), &request.email, &request.password)
            .map_err(ApiError::from)
    })
    .await??;

    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

/// `POST /auth/login`: exchange email and password for an access token.
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let core = ctx.core.clone();
    let user = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let conn = core.open_db()?;
        auth::authenticate(&conn, core.hasher(), &request.email, &request.password)
            .map_err(ApiError::from)
    })
    .await?
    .inspect_err(|e| tracing::info!(error = %e, "Login refused"))?;

    let access_token = ctx.core.jwt().issue(&user)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
        expires_in: ctx.core.jwt().lifetime_secs(),
        user: UserView::from(&user),
    }))
}

/// `GET /auth/users/me`
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(current): Extension<AuthenticatedUser>,
) -> Result<Json<UserView>, ApiError> {
    let conn = ctx.core.open_db()?;
    let user = db::get_user_by_id(&conn, &current.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(UserView::from(&user)))
}

/// `GET /auth/google/login`: redirect to the provider consent page.
pub async fn google_login(State(ctx): State<ApiContext>) -> Result<Redirect, ApiError> {
    let provider = ctx
        .core
        .oauth_provider()
        .ok_or_else(|| ApiError::ServiceUnavailable {
            code: "OAUTH_NOT_CONFIGURED",
            message: "Google sign-in is not configured on this server".into(),
        })?;
    let url = provider.authorize_url()?;
    Ok(Redirect::temporary(&url))
}

/// `GET /auth/google/callback`: finish the code flow and hand the token
/// to the frontend. Every failure ends on the frontend error page.
pub async fn google_callback(
    State(ctx): State<ApiContext>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Redirect {
    let frontend = ctx.core.config.frontend_url.clone();
    match complete_oauth(&ctx, query).await {
        Ok((token, email)) => match success_url(&frontend, &token, &email) {
            Ok(url) => Redirect::temporary(&url),
            Err(e) => {
                tracing::error!(error = %e, "Cannot build OAuth success redirect");
                Redirect::temporary(&error_url(&frontend))
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "OAuth sign-in failed");
            Redirect::temporary(&error_url(&frontend))
        }
    }
}

async fn complete_oauth(
    ctx: &ApiContext,
    query: OAuthCallbackQuery,
) -> Result<(String, String), AuthError> {
    if let Some(error) = query.error {
        return Err(AuthError::OAuth(format!("provider returned error: {error}")));
    }
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::OAuth("missing authorization code".into()))?;
    let provider = ctx
        .core
        .oauth_provider()
        .ok_or_else(|| AuthError::OAuth("provider not configured".into()))?;

    let core = ctx.core.clone();
    let user = tokio::task::spawn_blocking(move || -> Result<_, AuthError> {
        let identity = provider.exchange_code(&code)?;
        let conn = core
            .open_db()
            .map_err(|e| AuthError::OAuth(e.to_string()))?;
        auth::sign_in_with_oauth(&conn, &identity)
    })
    .await
    .map_err(|e| AuthError::OAuth(format!("blocking task failed: {e}")))??;

    let token = ctx.core.jwt().issue(&user)?;
    Ok((token, user.email))
}

fn success_url(frontend: &str, token: &str, email: &str) -> Result<String, String> {
    let url = reqwest::Url::parse_with_params(
        &format!("{frontend}/auth/oauth-success"),
        &[("token", token), ("email", email)],
    )
    .map_err(|e| e.to_string())?;
    Ok(url.into())
}

fn error_url(frontend: &str) -> String {
    format!("{frontend}/auth/error?error=OAuthSignin")
}
