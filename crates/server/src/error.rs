use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::user::UserError;
use serde_json::json;
use thiserror::Error;

/// Every failure a handler can surface. All of them are normal, user-visible
/// outcomes; only `Database` and `Hashing` map to a 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthorized,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("invalid `{field}`: {message}")]
    Validation { field: String, message: String },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl ApiError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Collapse a `validator` error set into the first field-keyed message.
    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        for (field, field_errors) in errors.field_errors() {
            if let Some(first) = field_errors.first() {
                let message = first
                    .message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| first.code.to_string());
                return ApiError::validation(field.to_string(), message);
            }
        }
        ApiError::validation("non_field_errors", "invalid input")
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::EmailTaken => {
                ApiError::validation("email", "A user with this email already exists.")
            }
            UserError::Database(err) => ApiError::Database(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "authentication required" })),
            )
                .into_response(),
            ApiError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": message }))).into_response()
            }
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("{what} not found") })),
            )
                .into_response(),
            ApiError::Validation { field, message } => {
                let mut body = serde_json::Map::new();
                body.insert(field, serde_json::Value::String(message));
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::Value::Object(body)),
                )
                    .into_response()
            }
            ApiError::Database(err) => {
                tracing::error!(?err, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
            ApiError::Hashing(message) => {
                tracing::error!(%message, "password hashing error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
