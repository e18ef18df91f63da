use axum::{
    Json,
    extract::{Extension, State},
};
use chrono::Utc;
use db::models::{dashboard::DashboardStats, user::User};

use crate::{AppState, error::ApiError};

/// Snapshot counters for the caller's personal dashboard.
pub async fn stats(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<DashboardStats>, ApiError> {
    let stats = DashboardStats::for_user(state.pool(), user.id, Utc::now()).await?;
    Ok(Json(stats))
}
