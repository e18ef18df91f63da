use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::{
    column::ColumnStatus,
    user::UserSummary,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum TaskPriority {
    #[serde(rename = "low")]
    #[sqlx(rename = "LOW")]
    Low,
    #[serde(rename = "medium")]
    #[sqlx(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "high")]
    #[sqlx(rename = "HIGH")]
    High,
    #[serde(rename = "critical")]
    #[sqlx(rename = "CRITICAL")]
    Critical,
}

impl TaskPriority {
    /// External label, case-insensitive in, lowercase out.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            "critical" => Some(TaskPriority::Critical),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: Uuid,
    pub board_id: Uuid,
    pub column_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: TaskPriority,
    pub assignee_id: Option<Uuid>,
    pub reviewer_id: Option<Uuid>,
    pub position: i64,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Fully resolved create payload; label mapping and column resolution happen
/// before this is built.
#[derive(Debug, Clone)]
pub struct CreateTaskData {
    pub board_id: Uuid,
    pub column_id: Uuid,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: TaskPriority,
    pub assignee_id: Option<Uuid>,
    pub reviewer_id: Option<Uuid>,
    pub created_by: Uuid,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Final field values for a full-row update; merge semantics (partial vs
/// full replace) are decided by the caller.
#[derive(Debug, Clone)]
pub struct UpdateTaskFields {
    pub column_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: TaskPriority,
    pub assignee_id: Option<Uuid>,
    pub reviewer_id: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Read projection: task plus its derived status, embedded user summaries
/// and comment count.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetail {
    pub id: Uuid,
    pub board_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: Option<ColumnStatus>,
    pub priority: TaskPriority,
    pub assignee: Option<UserSummary>,
    pub reviewer: Option<UserSummary>,
    pub due_date: Option<NaiveDate>,
    pub comments_count: i64,
}

#[derive(FromRow)]
struct TaskDetailRow {
    id: Uuid,
    board_id: Uuid,
    title: String,
    description: String,
    status: Option<ColumnStatus>,
    priority: TaskPriority,
    due_date: Option<NaiveDate>,
    comments_count: i64,
    assignee_id: Option<Uuid>,
    assignee_username: Option<String>,
    assignee_email: Option<String>,
    assignee_first_name: Option<String>,
    assignee_last_name: Option<String>,
    reviewer_id: Option<Uuid>,
    reviewer_username: Option<String>,
    reviewer_email: Option<String>,
    reviewer_first_name: Option<String>,
    reviewer_last_name: Option<String>,
}

impl From<TaskDetailRow> for TaskDetail {
    fn from(row: TaskDetailRow) -> Self {
        TaskDetail {
            id: row.id,
            board_id: row.board_id,
            title: row.title,
            description: row.description,
            status: row.status,
            priority: row.priority,
            assignee: UserSummary::from_join(
                row.assignee_id,
                row.assignee_username,
                row.assignee_email,
                row.assignee_first_name,
                row.assignee_last_name,
            ),
            reviewer: UserSummary::from_join(
                row.reviewer_id,
                row.reviewer_username,
                row.reviewer_email,
                row.reviewer_first_name,
                row.reviewer_last_name,
            ),
            due_date: row.due_date,
            comments_count: row.comments_count,
        }
    }
}

const TASK_COLUMNS: &str = "id, board_id, column_id, title, description, due_date, priority,
    assignee_id, reviewer_id, position, created_by, created_at, updated_at, completed_at";

fn detail_query(filter: &str, order: &str) -> String {
    format!(
        "SELECT
            t.id, t.board_id, t.title, t.description,
            c.status AS status, t.priority, t.due_date,
            (SELECT COUNT(*) FROM activities x WHERE x.task_id = t.id) AS comments_count,
            a.id AS assignee_id, a.username AS assignee_username, a.email AS assignee_email,
            a.first_name AS assignee_first_name, a.last_name AS assignee_last_name,
            r.id AS reviewer_id, r.username AS reviewer_username, r.email AS reviewer_email,
            r.first_name AS reviewer_first_name, r.last_name AS reviewer_last_name
         FROM tasks t
         JOIN boards b ON b.id = t.board_id
         LEFT JOIN columns c ON c.id = t.column_id
         LEFT JOIN users a ON a.id = t.assignee_id
         LEFT JOIN users r ON r.id = t.reviewer_id
         {filter}
         {order}"
    )
}

impl Task {
    pub async fn create(pool: &SqlitePool, data: CreateTaskData) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (
                id, board_id, column_id, title, description, due_date, priority,
                assignee_id, reviewer_id, position, created_by, created_at, updated_at, completed_at
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(data.board_id)
        .bind(data.column_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.due_date)
        .bind(data.priority)
        .bind(data.assignee_id)
        .bind(data.reviewer_id)
        .bind(0i64)
        .bind(data.created_by)
        .bind(now)
        .bind(now)
        .bind(data.completed_at)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        fields: UpdateTaskFields,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET column_id = $2,
                 title = $3,
                 description = $4,
                 due_date = $5,
                 priority = $6,
                 assignee_id = $7,
                 reviewer_id = $8,
                 completed_at = $9,
                 updated_at = $10
             WHERE id = $1
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(fields.column_id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.due_date)
        .bind(fields.priority)
        .bind(fields.assignee_id)
        .bind(fields.reviewer_id)
        .bind(fields.completed_at)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn find_detail(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<Option<TaskDetail>, sqlx::Error> {
        let row = sqlx::query_as::<_, TaskDetailRow>(&detail_query("WHERE t.id = $1", ""))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(TaskDetail::from))
    }

    /// Tasks on boards the user owns or belongs to.
    pub async fn list_details_for_member(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<TaskDetail>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TaskDetailRow>(&detail_query(
            "WHERE b.owner_id = $1
                OR EXISTS (SELECT 1 FROM board_members m WHERE m.board_id = b.id AND m.user_id = $1)",
            "ORDER BY c.position, t.position, t.id",
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(TaskDetail::from).collect())
    }

    pub async fn list_details_for_board(
        pool: &SqlitePool,
        board_id: Uuid,
    ) -> Result<Vec<TaskDetail>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TaskDetailRow>(&detail_query(
            "WHERE t.board_id = $1",
            "ORDER BY c.position, t.position, t.id",
        ))
        .bind(board_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(TaskDetail::from).collect())
    }

    pub async fn list_assigned(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<TaskDetail>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TaskDetailRow>(&detail_query(
            "WHERE t.assignee_id = $1",
            "ORDER BY t.due_date, t.id",
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(TaskDetail::from).collect())
    }

    pub async fn list_reviewing(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<TaskDetail>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TaskDetailRow>(&detail_query(
            "WHERE t.reviewer_id = $1",
            "ORDER BY t.due_date, t.id",
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(TaskDetail::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{board::Board, column::Column, user::User};

    #[test]
    fn priority_labels_round_trip_case_insensitive() {
        for label in ["low", "medium", "high", "critical"] {
            let priority = TaskPriority::from_label(label).unwrap();
            assert_eq!(priority.label(), label);
            assert_eq!(
                TaskPriority::from_label(&label.to_ascii_uppercase()),
                Some(priority)
            );
        }
        assert_eq!(TaskPriority::from_label("urgent"), None);
    }

    async fn seed(pool: &SqlitePool) -> (User, Board, Column) {
        let owner = User::register(pool, "owner@example.com", "Board", "Owner", "hash")
            .await
            .unwrap();
        let board = Board::create(pool, "Sprint", owner.id, &[]).await.unwrap();
        let column = Column::find_by_board_and_status(pool, board.id, ColumnStatus::Todo)
            .await
            .unwrap()
            .unwrap();
        (owner, board, column)
    }

    #[tokio::test]
    async fn create_and_read_back_derived_status() {
        let db = crate::DBService::new_in_memory().await.unwrap();
        let (owner, board, column) = seed(&db.pool).await;

        let task = Task::create(
            &db.pool,
            CreateTaskData {
                board_id: board.id,
                column_id: column.id,
                title: "Write docs".into(),
                description: String::new(),
                due_date: None,
                priority: TaskPriority::Medium,
                assignee_id: Some(owner.id),
                reviewer_id: None,
                created_by: owner.id,
                completed_at: None,
            },
        )
        .await
        .unwrap();

        let detail = Task::find_detail(&db.pool, task.id).await.unwrap().unwrap();
        assert_eq!(detail.status, Some(ColumnStatus::Todo));
        assert_eq!(detail.priority, TaskPriority::Medium);
        assert_eq!(detail.assignee.as_ref().unwrap().id, owner.id);
        assert!(detail.reviewer.is_none());
        assert_eq!(detail.comments_count, 0);
    }

    #[tokio::test]
    async fn tasks_without_column_have_no_status() {
        let db = crate::DBService::new_in_memory().await.unwrap();
        let (owner, board, column) = seed(&db.pool).await;

        let task = Task::create(
            &db.pool,
            CreateTaskData {
                board_id: board.id,
                column_id: column.id,
                title: "Orphan".into(),
                description: String::new(),
                due_date: None,
                priority: TaskPriority::Low,
                assignee_id: None,
                reviewer_id: None,
                created_by: owner.id,
                completed_at: None,
            },
        )
        .await
        .unwrap();

        sqlx::query("UPDATE tasks SET column_id = NULL WHERE id = $1")
            .bind(task.id)
            .execute(&db.pool)
            .await
            .unwrap();

        let detail = Task::find_detail(&db.pool, task.id).await.unwrap().unwrap();
        assert_eq!(detail.status, None);
    }
}
