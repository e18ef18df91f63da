use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::user::display_name;

/// A comment on a task. Append-only; deletion is reserved to the author.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Activity {
    pub id: Uuid,
    pub task_id: Uuid,
    pub author_id: Option<Uuid>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Comment as rendered under a task: the author collapses to a display name,
/// "Unknown" once the account is gone.
#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub author: String,
    pub content: String,
}

#[derive(FromRow)]
struct CommentRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    message: String,
    author_username: Option<String>,
    author_first_name: Option<String>,
    author_last_name: Option<String>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        let author = match row.author_username {
            Some(username) => display_name(
                row.author_first_name.as_deref().unwrap_or(""),
                row.author_last_name.as_deref().unwrap_or(""),
                &username,
            ),
            None => "Unknown".to_string(),
        };
        Comment {
            id: row.id,
            created_at: row.created_at,
            author,
            content: row.message,
        }
    }
}

const ACTIVITY_COLUMNS: &str = "id, task_id, author_id, message, created_at";

impl Activity {
    pub async fn create(
        pool: &SqlitePool,
        task_id: Uuid,
        author_id: Uuid,
        message: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Activity>(&format!(
            "INSERT INTO activities (id, task_id, author_id, message, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {ACTIVITY_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(task_id)
        .bind(author_id)
        .bind(message)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Scoped lookup: the comment must belong to the given task.
    pub async fn find_for_task(
        pool: &SqlitePool,
        task_id: Uuid,
        activity_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Activity>(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = $1 AND task_id = $2"
        ))
        .bind(activity_id)
        .bind(task_id)
        .fetch_optional(pool)
        .await
    }

    /// All comments of a task, oldest first.
    pub async fn list_comments(
        pool: &SqlitePool,
        task_id: Uuid,
    ) -> Result<Vec<Comment>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CommentRow>(
            "SELECT a.id, a.created_at, a.message,
                    u.username AS author_username,
                    u.first_name AS author_first_name,
                    u.last_name AS author_last_name
             FROM activities a
             LEFT JOIN users u ON u.id = a.author_id
             WHERE a.task_id = $1
             ORDER BY a.created_at",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM activities WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        board::Board,
        column::{Column, ColumnStatus},
        task::{CreateTaskData, Task, TaskPriority},
        user::User,
    };

    #[tokio::test]
    async fn comments_list_in_creation_order_with_author_names() {
        let db = crate::DBService::new_in_memory().await.unwrap();
        let owner = User::register(&db.pool, "owner@example.com", "Grace", "Hopper", "hash")
            .await
            .unwrap();
        let board = Board::create(&db.pool, "Sprint", owner.id, &[]).await.unwrap();
        let column = Column::find_by_board_and_status(&db.pool, board.id, ColumnStatus::Todo)
            .await
            .unwrap()
            .unwrap();
        let task = Task::create(
            &db.pool,
            CreateTaskData {
                board_id: board.id,
                column_id: column.id,
                title: "Ship it".into(),
                description: String::new(),
                due_date: None,
                priority: TaskPriority::High,
                assignee_id: None,
                reviewer_id: None,
                created_by: owner.id,
                completed_at: None,
            },
        )
        .await
        .unwrap();

        Activity::create(&db.pool, task.id, owner.id, "first").await.unwrap();
        Activity::create(&db.pool, task.id, owner.id, "second").await.unwrap();

        let comments = Activity::list_comments(&db.pool, task.id).await.unwrap();
        let contents: Vec<_> = comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
        assert_eq!(comments[0].author, "Grace Hopper");
    }
}
