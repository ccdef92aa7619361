//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::analysis::AnalysisError;
use crate::auth::AuthError;
use crate::core_state::CoreError;
use crate::db::DatabaseError;
use crate::extraction::ExtractionError;
use crate::report::ReportError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("Service unavailable ({code}): {message}")]
    ServiceUnavailable { code: &'static str, message: String },
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_EXPIRED",
                "Token expired, sign in again".to_string(),
            ),
            ApiError::InvalidCredentials(detail) => {
                (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", detail)
            }
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail),
            ApiError::PayloadTooLarge(detail) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", detail)
            }
            ApiError::ServiceUnavailable { code, message } => {
                tracing::warn!(code, %message, "API dependency unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, code, message)
            }
            ApiError::Internal(detail) => {
                tracing::error!(%detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::LockPoisoned => ApiError::Internal("lock poisoned".into()),
            CoreError::Database(e) => ApiError::Internal(e.to_string()),
            CoreError::CatalogUnavailable(detail) => ApiError::ServiceUnavailable {
                code: "CATALOG_UNAVAILABLE",
                message: format!("Reference catalog cannot be read: {detail}"),
            },
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, .. } => {
                ApiError::NotFound(format!("{entity_type} not found"))
            }
            DatabaseError::ConstraintViolation(detail) => ApiError::Conflict(detail),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InactiveAccount => {
                ApiError::InvalidCredentials(err.to_string())
            }
            AuthError::EmailTaken => ApiError::Conflict(err.to_string()),
            AuthError::InvalidEmail | AuthError::WeakPassword => {
                ApiError::BadRequest(err.to_string())
            }
            AuthError::TokenInvalid => ApiError::Unauthorized,
            AuthError::TokenExpired => ApiError::TokenExpired,
            AuthError::Database(e) => ApiError::from(e),
            AuthError::Hashing(_) | AuthError::OAuth(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::EmptyPdf | ExtractionError::NotPdf | ExtractionError::NoBiomarkers => {
                ApiError::BadRequest(err.to_string())
            }
            ExtractionError::PdfTooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            ExtractionError::NotConfigured => ApiError::ServiceUnavailable {
                code: "EXTRACTION_NOT_CONFIGURED",
                message: "PDF extraction is not configured on this server".into(),
            },
            ExtractionError::Connection(_)
            | ExtractionError::Provider { .. }
            | ExtractionError::HttpClient(_) => {
                tracing::warn!(error = %err, "Extraction provider failed");
                ApiError::ServiceUnavailable {
                    code: "EXTRACTION_UNAVAILABLE",
                    message: "The extraction service is unavailable, try again later".into(),
                }
            }
            ExtractionError::MalformedResponse(_) | ExtractionError::JsonParsing(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_returns_401() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn not_found_returns_404() {
        let response = ApiError::NotFound("Profile not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_request_returns_400() {
        let response = ApiError::BadRequest("No biomarker provided".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], "No biomarker provided");
    }

    #[tokio::test]
    async fn internal_returns_500() {
        let response = ApiError::Internal("something broke".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        // Internal errors hide details from client
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn catalog_unavailable_returns_503() {
        let err = ApiError::from(CoreError::CatalogUnavailable("disk I/O error".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "CATALOG_UNAVAILABLE");
    }

    #[tokio::test]
    async fn email_taken_returns_409() {
        let response = ApiError::from(AuthError::EmailTaken).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn inactive_account_returns_401() {
        let response = ApiError::from(AuthError::InactiveAccount).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "INVALID_CREDENTIALS");
    }

    #[test]
    fn auth_token_errors_map_to_auth_variants() {
        assert!(matches!(
            ApiError::from(AuthError::TokenExpired),
            ApiError::TokenExpired
        ));
        assert!(matches!(
            ApiError::from(AuthError::TokenInvalid),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from(AuthError::WeakPassword),
            ApiError::BadRequest(_)
        ));
    }

    #[test]
    fn extraction_errors_map_by_cause() {
        assert!(matches!(
            ApiError::from(ExtractionError::PdfTooLarge {
                size_mb: 12.5,
                max_mb: 10
            }),
            ApiError::PayloadTooLarge(_)
        ));
        assert!(matches!(
            ApiError::from(ExtractionError::NotPdf),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(ExtractionError::NotConfigured),
            ApiError::ServiceUnavailable {
                code: "EXTRACTION_NOT_CONFIGURED",
                ..
            }
        ));
        assert!(matches!(
            ApiError::from(ExtractionError::Connection("refused".into())),
            ApiError::ServiceUnavailable {
                code: "EXTRACTION_UNAVAILABLE",
                ..
            }
        ));
    }

    #[test]
    fn database_not_found_maps_to_404() {
        let err = ApiError::from(DatabaseError::NotFound {
            entity_type: "Profile".into(),
            id: "x".into(),
        });
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Profile not found"));
    }

    #[test]
    fn malformed_value_maps_to_400() {
        let err = ApiError::from(AnalysisError::EmptyInput);
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
