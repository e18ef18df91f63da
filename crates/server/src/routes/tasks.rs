use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use db::models::{
    board::Board,
    column::{Column, ColumnStatus},
    task::{CreateTaskData, Task, TaskDetail, TaskPriority, UpdateTaskFields},
    user::{User, UserSummary},
};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    permissions::{can_delete_task, can_edit_task, ensure_board_access, owning_board},
};

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub board: Uuid,
    pub title: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub reviewer_id: Option<Uuid>,
}

/// Shared between PATCH (partial) and PUT (full replace). Nullable
/// references distinguish "omitted" from "set to null".
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub reviewer_id: Option<Option<Uuid>>,
}

/// Distinguishes an explicit `null` from an absent field.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub status: Option<&'static str>,
    pub priority: &'static str,
    pub assignee: Option<UserSummary>,
    pub reviewer: Option<UserSummary>,
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments_count: Option<i64>,
}

impl TaskResponse {
    fn from_detail(detail: TaskDetail, include_board: bool, include_comments: bool) -> Self {
        TaskResponse {
            id: detail.id,
            board: include_board.then_some(detail.board_id),
            title: detail.title,
            description: detail.description,
            status: detail.status.map(ColumnStatus::label),
            priority: detail.priority.label(),
            assignee: detail.assignee,
            reviewer: detail.reviewer,
            due_date: detail.due_date,
            comments_count: include_comments.then_some(detail.comments_count),
        }
    }

    /// Full read shape.
    pub fn read(detail: TaskDetail) -> Self {
        Self::from_detail(detail, true, true)
    }

    /// Task embedded in a board detail: no `board` field.
    pub fn in_board(detail: TaskDetail) -> Self {
        Self::from_detail(detail, false, true)
    }

    /// Partial-update response: neither `board` nor `comments_count`.
    fn updated(detail: TaskDetail) -> Self {
        Self::from_detail(detail, false, false)
    }
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let tasks = Task::list_details_for_member(state.pool(), user.id).await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::read).collect()))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let board = Board::find_by_id(state.pool(), payload.board)
        .await?
        .ok_or(ApiError::NotFound("board"))?;
    if !board.is_owner(user.id) && !Board::has_member(state.pool(), board.id, user.id).await? {
        return Err(ApiError::forbidden(
            "You must be a member of the board to create a task.",
        ));
    }

    let status_label = payload
        .status
        .ok_or_else(|| ApiError::validation("status", "This field is required."))?;
    let priority_label = payload
        .priority
        .ok_or_else(|| ApiError::validation("priority", "This field is required."))?;

    let column = resolve_column(state.pool(), board.id, &status_label).await?;
    let priority = parse_priority(&priority_label)?;
    let assignee_id = check_user_ref(state.pool(), payload.assignee_id, "assignee_id").await?;
    let reviewer_id = check_user_ref(state.pool(), payload.reviewer_id, "reviewer_id").await?;

    let completed_at = match column.status {
        ColumnStatus::Done => Some(Utc::now()),
        _ => None,
    };

    let task = Task::create(
        state.pool(),
        CreateTaskData {
            board_id: board.id,
            column_id: column.id,
            title: payload.title,
            description: payload.description.unwrap_or_default(),
            due_date: payload.due_date,
            priority,
            assignee_id,
            reviewer_id,
            created_by: user.id,
            completed_at,
        },
    )
    .await?;

    let detail = Task::find_detail(state.pool(), task.id)
        .await?
        .ok_or(ApiError::NotFound("task"))?;
    Ok((StatusCode::CREATED, Json(TaskResponse::read(detail))))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = Task::find_by_id(state.pool(), task_id)
        .await?
        .ok_or(ApiError::NotFound("task"))?;
    let board = owning_board(state.pool(), &task).await?;
    ensure_board_access(state.pool(), &board, &user).await?;

    let detail = Task::find_detail(state.pool(), task.id)
        .await?
        .ok_or(ApiError::NotFound("task"))?;
    Ok(Json(TaskResponse::read(detail)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    let detail = apply_update(&state, &user, task_id, payload, false).await?;
    Ok(Json(TaskResponse::updated(detail)))
}

pub async fn replace_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    let detail = apply_update(&state, &user, task_id, payload, true).await?;
    Ok(Json(TaskResponse::read(detail)))
}

/// Merge the payload over the stored row. With `full_replace`, title, status
/// and priority are mandatory and omitted optionals reset to their defaults;
/// otherwise omitted fields stay untouched. The board never changes.
async fn apply_update(
    state: &AppState,
    user: &User,
    task_id: Uuid,
    payload: UpdateTaskRequest,
    full_replace: bool,
) -> Result<TaskDetail, ApiError> {
    let task = Task::find_by_id(state.pool(), task_id)
        .await?
        .ok_or(ApiError::NotFound("task"))?;
    let board = owning_board(state.pool(), &task).await?;
    if !can_edit_task(&board, &task, user) {
        return Err(ApiError::forbidden(
            "Only the board owner, assignee or reviewer may update this task.",
        ));
    }

    if full_replace {
        for (value, field) in [
            (payload.title.is_none(), "title"),
            (payload.status.is_none(), "status"),
            (payload.priority.is_none(), "priority"),
        ] {
            if value {
                return Err(ApiError::validation(field, "This field is required."));
            }
        }
    }

    let current_status = match task.column_id {
        Some(column_id) => Column::find_by_id(state.pool(), column_id)
            .await?
            .map(|c| c.status),
        None => None,
    };

    // Entering DONE stamps completed_at, leaving DONE clears it, staying
    // keeps the original stamp.
    let (column_id, completed_at) = match &payload.status {
        Some(label) => {
            let column = resolve_column(state.pool(), task.board_id, label).await?;
            let completed_at = match column.status {
                ColumnStatus::Done if current_status == Some(ColumnStatus::Done) => {
                    task.completed_at
                }
                ColumnStatus::Done => Some(Utc::now()),
                _ => None,
            };
            (Some(column.id), completed_at)
        }
        None => (task.column_id, task.completed_at),
    };

    let priority = match &payload.priority {
        Some(label) => parse_priority(label)?,
        None => task.priority,
    };

    let assignee_id = match payload.assignee_id {
        Some(value) => check_user_ref(state.pool(), value, "assignee_id").await?,
        None if full_replace => None,
        None => task.assignee_id,
    };
    let reviewer_id = match payload.reviewer_id {
        Some(value) => check_user_ref(state.pool(), value, "reviewer_id").await?,
        None if full_replace => None,
        None => task.reviewer_id,
    };
    let due_date = match payload.due_date {
        Some(value) => value,
        None if full_replace => None,
        None => task.due_date,
    };
    let description = match payload.description {
        Some(value) => value,
        None if full_replace => String::new(),
        None => task.description,
    };

    let fields = UpdateTaskFields {
        column_id,
        title: payload.title.unwrap_or(task.title),
        description,
        due_date,
        priority,
        assignee_id,
        reviewer_id,
        completed_at,
    };

    let updated = Task::update(state.pool(), task_id, fields)
        .await?
        .ok_or(ApiError::NotFound("task"))?;
    Task::find_detail(state.pool(), updated.id)
        .await?
        .ok_or(ApiError::NotFound("task"))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(task_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let task = Task::find_by_id(state.pool(), task_id)
        .await?
        .ok_or(ApiError::NotFound("task"))?;
    let board = owning_board(state.pool(), &task).await?;
    if !can_delete_task(&board, &task, &user) {
        return Err(ApiError::forbidden(
            "Only the board owner or the task creator may delete this task.",
        ));
    }

    Task::delete(state.pool(), task.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn assigned_to_me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let tasks = Task::list_assigned(state.pool(), user.id).await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::read).collect()))
}

pub async fn reviewing(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let tasks = Task::list_reviewing(state.pool(), user.id).await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::read).collect()))
}

/// Map a status label to the column carrying that status on the task's own
/// board.
async fn resolve_column(
    pool: &SqlitePool,
    board_id: Uuid,
    label: &str,
) -> Result<Column, ApiError> {
    let status = ColumnStatus::from_label(label).ok_or_else(|| {
        ApiError::validation(
            "status",
            "Invalid status. Allowed: to-do, in-progress, review, done.",
        )
    })?;
    Column::find_by_board_and_status(pool, board_id, status)
        .await?
        .ok_or_else(|| {
            ApiError::validation("status", "This board has no column with this status.")
        })
}

fn parse_priority(label: &str) -> Result<TaskPriority, ApiError> {
    TaskPriority::from_label(label).ok_or_else(|| {
        ApiError::validation(
            "priority",
            "Invalid priority. Allowed: low, medium, high, critical.",
        )
    })
}

/// A provided user reference must point at an existing user; `None` clears
/// the field.
async fn check_user_ref(
    pool: &SqlitePool,
    user_id: Option<Uuid>,
    field: &str,
) -> Result<Option<Uuid>, ApiError> {
    match user_id {
        Some(id) => {
            if User::find_by_id(pool, id).await?.is_none() {
                return Err(ApiError::validation(
                    field,
                    format!("user {id} does not exist"),
                ));
            }
            Ok(Some(id))
        }
        None => Ok(None),
    }
}
