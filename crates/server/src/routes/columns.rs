use axum::{
    Json,
    extract::{Extension, Path, State},
};
use db::models::{
    column::{Column, ColumnStatus},
    user::User,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    permissions::{ensure_board_access, owning_board},
};

#[derive(Debug, Deserialize)]
pub struct UpdateColumnRequest {
    pub name: Option<String>,
    pub position: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ColumnResponse {
    pub id: Uuid,
    pub board: Uuid,
    pub name: String,
    pub status: ColumnStatus,
    pub position: i64,
}

impl From<Column> for ColumnResponse {
    fn from(column: Column) -> Self {
        ColumnResponse {
            id: column.id,
            board: column.board_id,
            name: column.name,
            status: column.status,
            position: column.position,
        }
    }
}

pub async fn list_columns(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<ColumnResponse>>, ApiError> {
    let columns = Column::list_for_user(state.pool(), user.id).await?;
    Ok(Json(columns.into_iter().map(ColumnResponse::from).collect()))
}

pub async fn get_column(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(column_id): Path<Uuid>,
) -> Result<Json<ColumnResponse>, ApiError> {
    let column = Column::find_by_id(state.pool(), column_id)
        .await?
        .ok_or(ApiError::NotFound("column"))?;
    let board = owning_board(state.pool(), &column).await?;
    ensure_board_access(state.pool(), &board, &user).await?;

    Ok(Json(ColumnResponse::from(column)))
}

/// Columns can be renamed and reordered; their status and board are fixed.
pub async fn update_column(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(column_id): Path<Uuid>,
    Json(payload): Json<UpdateColumnRequest>,
) -> Result<Json<ColumnResponse>, ApiError> {
    let column = Column::find_by_id(state.pool(), column_id)
        .await?
        .ok_or(ApiError::NotFound("column"))?;
    let board = owning_board(state.pool(), &column).await?;
    ensure_board_access(state.pool(), &board, &user).await?;

    let column = Column::update(
        state.pool(),
        column.id,
        payload.name.as_deref(),
        payload.position,
    )
    .await?
    .ok_or(ApiError::NotFound("column"))?;

    Ok(Json(ColumnResponse::from(column)))
}
