use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use db::models::{
    board::{Board, BoardSummary},
    task::Task,
    user::{User, UserSummary},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    permissions::{ensure_board_access, ensure_board_owner},
    routes::tasks::TaskResponse,
};

#[derive(Debug, Deserialize)]
pub struct CreateBoardRequest {
    pub title: String,
    #[serde(default)]
    pub members: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBoardRequest {
    pub title: Option<String>,
    pub members: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize)]
pub struct BoardDetailResponse {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Uuid,
    pub members: Vec<UserSummary>,
    pub tasks: Vec<TaskResponse>,
}

#[derive(Debug, Serialize)]
pub struct BoardUpdateResponse {
    pub id: Uuid,
    pub title: String,
    pub owner_data: UserSummary,
    pub members_data: Vec<UserSummary>,
}

pub async fn list_boards(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<BoardSummary>>, ApiError> {
    let boards = Board::list_for_user(state.pool(), user.id).await?;
    Ok(Json(boards))
}

pub async fn create_board(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateBoardRequest>,
) -> Result<(StatusCode, Json<BoardSummary>), ApiError> {
    ensure_users_exist(state.pool(), &payload.members, "members").await?;

    let board = Board::create(state.pool(), &payload.title, user.id, &payload.members).await?;
    let summary = Board::summary(state.pool(), board.id)
        .await?
        .ok_or(ApiError::NotFound("board"))?;
    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn get_board(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(board_id): Path<Uuid>,
) -> Result<Json<BoardDetailResponse>, ApiError> {
    let board = Board::find_by_id(state.pool(), board_id)
        .await?
        .ok_or(ApiError::NotFound("board"))?;
    ensure_board_access(state.pool(), &board, &user).await?;

    let members = Board::members(state.pool(), board.id)
        .await?
        .iter()
        .map(User::summary)
        .collect();
    let tasks = Task::list_details_for_board(state.pool(), board.id)
        .await?
        .into_iter()
        .map(TaskResponse::in_board)
        .collect();

    Ok(Json(BoardDetailResponse {
        id: board.id,
        title: board.title,
        owner_id: board.owner_id,
        members,
        tasks,
    }))
}

pub async fn update_board(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(board_id): Path<Uuid>,
    Json(payload): Json<UpdateBoardRequest>,
) -> Result<Json<BoardUpdateResponse>, ApiError> {
    let board = Board::find_by_id(state.pool(), board_id)
        .await?
        .ok_or(ApiError::NotFound("board"))?;
    ensure_board_access(state.pool(), &board, &user).await?;

    if let Some(member_ids) = &payload.members {
        ensure_users_exist(state.pool(), member_ids, "members").await?;
        Board::replace_members(state.pool(), board.id, member_ids).await?;
    }
    let board = Board::update_title(state.pool(), board.id, payload.title.as_deref())
        .await?
        .ok_or(ApiError::NotFound("board"))?;

    let owner = User::find_by_id(state.pool(), board.owner_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    let members = Board::members(state.pool(), board.id)
        .await?
        .iter()
        .map(User::summary)
        .collect();

    Ok(Json(BoardUpdateResponse {
        id: board.id,
        title: board.title,
        owner_data: owner.summary(),
        members_data: members,
    }))
}

pub async fn delete_board(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(board_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let board = Board::find_by_id(state.pool(), board_id)
        .await?
        .ok_or(ApiError::NotFound("board"))?;
    ensure_board_owner(&board, &user)?;

    Board::delete(state.pool(), board.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Referenced users must exist; the store would only report the broken
/// foreign key after the fact.
async fn ensure_users_exist(
    pool: &SqlitePool,
    user_ids: &[Uuid],
    field: &str,
) -> Result<(), ApiError> {
    for &user_id in user_ids {
        if User::find_by_id(pool, user_id).await?.is_none() {
            return Err(ApiError::validation(
                field,
                format!("user {user_id} does not exist"),
            ));
        }
    }
    Ok(())
}
