//! Object-level authorization. Every gated entity resolves to its owning
//! board; the checks are then keyed off that board.

use db::models::{
    board::Board,
    column::Column,
    task::Task,
    user::User,
};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::ApiError;

pub trait BoardScoped {
    fn board_id(&self) -> Uuid;
}

impl BoardScoped for Board {
    fn board_id(&self) -> Uuid {
        self.id
    }
}

impl BoardScoped for Column {
    fn board_id(&self) -> Uuid {
        self.board_id
    }
}

impl BoardScoped for Task {
    fn board_id(&self) -> Uuid {
        self.board_id
    }
}

/// Load the board an entity belongs to.
pub async fn owning_board<T: BoardScoped>(
    pool: &SqlitePool,
    entity: &T,
) -> Result<Board, ApiError> {
    Board::find_by_id(pool, entity.board_id())
        .await?
        .ok_or(ApiError::NotFound("board"))
}

/// The owner is always authorized, members via the member set.
pub async fn ensure_board_access(
    pool: &SqlitePool,
    board: &Board,
    user: &User,
) -> Result<(), ApiError> {
    if board.is_owner(user.id) || Board::has_member(pool, board.id, user.id).await? {
        Ok(())
    } else {
        Err(ApiError::forbidden("You are not a member of this board."))
    }
}

pub fn ensure_board_owner(board: &Board, user: &User) -> Result<(), ApiError> {
    if board.is_owner(user.id) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Only the board owner may perform this action.",
        ))
    }
}

/// Task updates: board owner, assignee or reviewer.
pub fn can_edit_task(board: &Board, task: &Task, user: &User) -> bool {
    board.is_owner(user.id)
        || task.assignee_id == Some(user.id)
        || task.reviewer_id == Some(user.id)
}

/// Task deletion: board owner or the task's creator.
pub fn can_delete_task(board: &Board, task: &Task, user: &User) -> bool {
    board.is_owner(user.id) || task.created_by == Some(user.id)
}
