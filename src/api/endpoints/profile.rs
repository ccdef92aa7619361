//! Health profile of the signed-in user. Every route requires a bearer token.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthenticatedUser};
use crate::db::{self, DatabaseError};
use crate::models::{ProfileUpdate, UserProfile};

/// `GET /api/profile/me`: the stored profile, created empty on first access.
pub async fn get(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<UserProfile>, ApiError> {
    let conn = ctx.core.open_db()?;
    let profile = db::get_or_create_profile(&conn, &user.user_id)?;
    Ok(Json(profile))
}

/// `POST /api/profile/me`: create the profile, or merge into the existing one.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(data): Json<ProfileUpdate>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let conn = ctx.core.open_db()?;
    let existed = db::get_profile(&conn, &user.user_id)?.is_some();
    let profile = db::upsert_profile(&conn, &user.user_id, data)?;

    let status = if existed {
        StatusCode::OK
    } else {
        tracing::info!(user_id = %user.user_id, "Profile created");
        StatusCode::CREATED
    };
    Ok((status, Json(profile)))
}

/// `PUT /api/profile/me`: update only the fields present in the body. An
/// explicit `null` clears the stored value.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(data): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, ApiError> {
    let conn = ctx.core.open_db()?;
    let profile = db::upsert_profile(&conn, &user.user_id, data)?;
    Ok(Json(profile))
}

/// `DELETE /api/profile/me`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.core.open_db()?;
    db::delete_profile(&conn, &user.user_id).map_err(|e| match e {
        DatabaseError::NotFound { .. } => ApiError::NotFound("Profile not found".into()),
        other => ApiError::from(other),
    })?;
    tracing::info!(user_id = %user.user_id, "Profile deleted");
    Ok(StatusCode::NO_CONTENT)
}
