use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::Tx;

/// The four fixed column statuses. Stored as the uppercase code; external
/// task payloads use the kebab-case label instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum ColumnStatus {
    #[serde(rename = "TODO")]
    #[sqlx(rename = "TODO")]
    Todo,
    #[serde(rename = "IN_PROGRESS")]
    #[sqlx(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "REVIEW")]
    #[sqlx(rename = "REVIEW")]
    Review,
    #[serde(rename = "DONE")]
    #[sqlx(rename = "DONE")]
    Done,
}

impl ColumnStatus {
    pub const ALL: [ColumnStatus; 4] = [
        ColumnStatus::Todo,
        ColumnStatus::InProgress,
        ColumnStatus::Review,
        ColumnStatus::Done,
    ];

    /// External label, case-sensitive. Unknown labels are rejected by the
    /// caller with a field-keyed validation error.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "to-do" => Some(ColumnStatus::Todo),
            "in-progress" => Some(ColumnStatus::InProgress),
            "review" => Some(ColumnStatus::Review),
            "done" => Some(ColumnStatus::Done),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColumnStatus::Todo => "to-do",
            ColumnStatus::InProgress => "in-progress",
            ColumnStatus::Review => "review",
            ColumnStatus::Done => "done",
        }
    }

    fn default_name(self) -> &'static str {
        match self {
            ColumnStatus::Todo => "To-do",
            ColumnStatus::InProgress => "In-progress",
            ColumnStatus::Review => "Review",
            ColumnStatus::Done => "Done",
        }
    }

    fn default_position(self) -> i64 {
        match self {
            ColumnStatus::Todo => 1,
            ColumnStatus::InProgress => 2,
            ColumnStatus::Review => 3,
            ColumnStatus::Done => 4,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Column {
    pub id: Uuid,
    pub board_id: Uuid,
    pub name: String,
    pub status: ColumnStatus,
    pub position: i64,
}

const COLUMN_COLUMNS: &str = "id, board_id, name, status, position";

impl Column {
    /// Insert the four default columns for a freshly created board, inside
    /// the board-creation transaction.
    pub(crate) async fn insert_defaults(tx: &mut Tx<'_>, board_id: Uuid) -> Result<(), sqlx::Error> {
        for status in ColumnStatus::ALL {
            sqlx::query(
                "INSERT INTO columns (id, board_id, name, status, position)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(Uuid::new_v4())
            .bind(board_id)
            .bind(status.default_name())
            .bind(status)
            .bind(status.default_position())
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Column>(&format!(
            "SELECT {COLUMN_COLUMNS} FROM columns WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// The column carrying `status` on a given board, if the board still has
    /// one.
    pub async fn find_by_board_and_status(
        pool: &SqlitePool,
        board_id: Uuid,
        status: ColumnStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Column>(&format!(
            "SELECT {COLUMN_COLUMNS} FROM columns WHERE board_id = $1 AND status = $2"
        ))
        .bind(board_id)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_for_board(
        pool: &SqlitePool,
        board_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Column>(&format!(
            "SELECT {COLUMN_COLUMNS} FROM columns WHERE board_id = $1 ORDER BY position, id"
        ))
        .bind(board_id)
        .fetch_all(pool)
        .await
    }

    /// Columns of every board the user owns or belongs to.
    pub async fn list_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Column>(
            "SELECT c.id, c.board_id, c.name, c.status, c.position FROM columns c
             JOIN boards b ON b.id = c.board_id
             WHERE b.owner_id = $1
                OR EXISTS (SELECT 1 FROM board_members m WHERE m.board_id = b.id AND m.user_id = $1)
             ORDER BY c.position, c.id",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Rename / reorder. Board and status are immutable.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        name: Option<&str>,
        position: Option<i64>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Column>(&format!(
            "UPDATE columns
             SET name = COALESCE($2, name),
                 position = COALESCE($3, position)
             WHERE id = $1
             RETURNING {COLUMN_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(position)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_round_trip() {
        for status in ColumnStatus::ALL {
            assert_eq!(ColumnStatus::from_label(status.label()), Some(status));
        }
    }

    #[test]
    fn status_labels_are_case_sensitive() {
        assert_eq!(ColumnStatus::from_label("To-Do"), None);
        assert_eq!(ColumnStatus::from_label("DONE"), None);
        assert_eq!(ColumnStatus::from_label("todo"), None);
    }
}
