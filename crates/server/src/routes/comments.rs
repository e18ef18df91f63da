use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use db::models::{
    activity::{Activity, Comment},
    task::Task,
    user::User,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    permissions::{ensure_board_access, owning_board},
};

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: Option<String>,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let task = load_task_for_member(&state, &user, task_id).await?;
    let comments = Activity::list_comments(state.pool(), task.id).await?;
    Ok(Json(comments))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let task = load_task_for_member(&state, &user, task_id).await?;

    let content = payload
        .content
        .as_deref()
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .ok_or_else(|| ApiError::validation("content", "This field is required."))?;

    let activity = Activity::create(state.pool(), task.id, user.id, content).await?;
    let comment = Comment {
        id: activity.id,
        created_at: activity.created_at,
        author: user.full_name(),
        content: activity.message,
    };
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Only the author may delete a comment; the board owner gets a 403 like
/// everyone else.
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path((task_id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let task = load_task_for_member(&state, &user, task_id).await?;

    let activity = Activity::find_for_task(state.pool(), task.id, comment_id)
        .await?
        .ok_or(ApiError::NotFound("comment"))?;
    if activity.author_id != Some(user.id) {
        return Err(ApiError::forbidden(
            "Only the author may delete this comment.",
        ));
    }

    Activity::delete(state.pool(), activity.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn load_task_for_member(
    state: &AppState,
    user: &User,
    task_id: Uuid,
) -> Result<Task, ApiError> {
    let task = Task::find_by_id(state.pool(), task_id)
        .await?
        .ok_or(ApiError::NotFound("task"))?;
    let board = owning_board(state.pool(), &task).await?;
    ensure_board_access(state.pool(), &board, user).await?;
    Ok(task)
}
