use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use db::models::token::SessionToken;
use tracing::warn;

use crate::{AppState, error::ApiError};

/// Resolve the bearer token to a user and stash it in the request
/// extensions. Missing or unknown tokens end the request with a 401.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let bearer = match req.headers().typed_get::<Authorization<Bearer>>() {
        Some(Authorization(bearer)) => bearer,
        None => return ApiError::Unauthorized.into_response(),
    };

    match SessionToken::find_user(state.pool(), bearer.token()).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Ok(None) => ApiError::Unauthorized.into_response(),
        Err(err) => {
            warn!(?err, "failed to resolve session token");
            ApiError::Database(err).into_response()
        }
    }
}
