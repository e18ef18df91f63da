use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use db::models::user::User;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{AppState, auth, error::ApiError};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    pub fullname: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long."))]
    pub password: String,
    pub repeated_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailCheckQuery {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub fullname: String,
    pub email: String,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct EmailCheckResponse {
    pub id: Uuid,
    pub email: String,
    pub fullname: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    payload
        .validate()
        .map_err(ApiError::from_validation_errors)?;
    if payload.password != payload.repeated_password {
        return Err(ApiError::validation("password", "Passwords do not match."));
    }

    let (first_name, last_name) = auth::split_fullname(&payload.fullname);
    let password_hash = auth::hash_password(&payload.password)?;

    let user = User::register(
        state.pool(),
        payload.email.trim(),
        &first_name,
        &last_name,
        &password_hash,
    )
    .await?;
    let token = auth::issue_or_get_token(state.pool(), user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            fullname: user.full_name(),
            email: user.email.clone(),
            user_id: user.id,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload
        .validate()
        .map_err(ApiError::from_validation_errors)?;

    let invalid = || ApiError::validation("detail", "Invalid email or password.");

    let user = User::find_by_email(state.pool(), payload.email.trim())
        .await?
        .ok_or_else(invalid)?;
    if !auth::verify_password(&payload.password, &user.password_hash) {
        return Err(invalid());
    }

    let token = auth::issue_or_get_token(state.pool(), user.id).await?;
    Ok(Json(AuthResponse {
        token,
        fullname: user.full_name(),
        email: user.email.clone(),
        user_id: user.id,
    }))
}

pub async fn email_check(
    State(state): State<AppState>,
    Query(query): Query<EmailCheckQuery>,
) -> Result<Json<EmailCheckResponse>, ApiError> {
    let user = User::find_by_email(state.pool(), query.email.trim())
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    Ok(Json(EmailCheckResponse {
        id: user.id,
        email: user.email.clone(),
        fullname: user.full_name(),
    }))
}
