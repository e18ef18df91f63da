use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::{Tx, column::Column, user::User};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Board {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Board list item with the aggregate counts the board index shows.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BoardSummary {
    pub id: Uuid,
    pub title: String,
    pub member_count: i64,
    pub ticket_count: i64,
    pub tasks_to_do_count: i64,
    pub tasks_high_prio_count: i64,
    pub owner_id: Uuid,
}

const BOARD_COLUMNS: &str = "id, title, owner_id, created_at";

const SUMMARY_COLUMNS: &str = "
    b.id,
    b.title,
    (SELECT COUNT(*) FROM board_members m WHERE m.board_id = b.id) AS member_count,
    (SELECT COUNT(*) FROM tasks t WHERE t.board_id = b.id) AS ticket_count,
    (SELECT COUNT(*) FROM tasks t
        JOIN columns c ON c.id = t.column_id
        WHERE t.board_id = b.id AND c.status = 'TODO') AS tasks_to_do_count,
    (SELECT COUNT(*) FROM tasks t
        WHERE t.board_id = b.id AND t.priority = 'HIGH') AS tasks_high_prio_count,
    b.owner_id
";

impl Board {
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Create the board, its owner membership, any requested members and the
    /// four default columns in one transaction.
    pub async fn create(
        pool: &SqlitePool,
        title: &str,
        owner_id: Uuid,
        member_ids: &[Uuid],
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let board = sqlx::query_as::<_, Board>(&format!(
            "INSERT INTO boards (id, title, owner_id, created_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {BOARD_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(owner_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        insert_member(&mut tx, board.id, owner_id).await?;
        for &user_id in member_ids {
            insert_member(&mut tx, board.id, user_id).await?;
        }
        Column::insert_defaults(&mut tx, board.id).await?;

        tx.commit().await?;
        Ok(board)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(&format!("SELECT {BOARD_COLUMNS} FROM boards WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Distinct union of boards the user owns or belongs to, by title.
    pub async fn list_for_user(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<BoardSummary>, sqlx::Error> {
        sqlx::query_as::<_, BoardSummary>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM boards b
             WHERE b.owner_id = $1
                OR EXISTS (SELECT 1 FROM board_members m WHERE m.board_id = b.id AND m.user_id = $1)
             ORDER BY b.title"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn summary(
        pool: &SqlitePool,
        board_id: Uuid,
    ) -> Result<Option<BoardSummary>, sqlx::Error> {
        sqlx::query_as::<_, BoardSummary>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM boards b WHERE b.id = $1"
        ))
        .bind(board_id)
        .fetch_optional(pool)
        .await
    }

    /// Membership-set check only; the owner is authorized separately.
    pub async fn has_member(
        pool: &SqlitePool,
        board_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM board_members WHERE board_id = $1 AND user_id = $2",
        )
        .bind(board_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn members(pool: &SqlitePool, board_id: Uuid) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT u.id, u.username, u.email, u.first_name, u.last_name,
                    u.password_hash, u.created_at, u.updated_at
             FROM board_members m
             JOIN users u ON u.id = m.user_id
             WHERE m.board_id = $1
             ORDER BY u.username",
        )
        .bind(board_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update_title(
        pool: &SqlitePool,
        id: Uuid,
        title: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(&format!(
            "UPDATE boards SET title = COALESCE($2, title) WHERE id = $1 RETURNING {BOARD_COLUMNS}"
        ))
        .bind(id)
        .bind(title)
        .fetch_optional(pool)
        .await
    }

    /// Replace the member set wholesale.
    pub async fn replace_members(
        pool: &SqlitePool,
        board_id: Uuid,
        member_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM board_members WHERE board_id = $1")
            .bind(board_id)
            .execute(&mut *tx)
            .await?;
        for &user_id in member_ids {
            insert_member(&mut tx, board_id, user_id).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

async fn insert_member(tx: &mut Tx<'_>, board_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO board_members (board_id, user_id) VALUES ($1, $2)")
        .bind(board_id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::column::ColumnStatus;

    async fn seed_user(pool: &SqlitePool, email: &str) -> User {
        User::register(pool, email, "Test", "User", "hash")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_board_adds_owner_membership_and_default_columns() {
        let db = crate::DBService::new_in_memory().await.unwrap();
        let owner = seed_user(&db.pool, "owner@example.com").await;

        let board = Board::create(&db.pool, "Sprint", owner.id, &[]).await.unwrap();

        assert!(board.is_owner(owner.id));
        assert!(Board::has_member(&db.pool, board.id, owner.id).await.unwrap());

        let columns = Column::list_for_board(&db.pool, board.id).await.unwrap();
        assert_eq!(columns.len(), 4);
        let statuses: Vec<_> = columns.iter().map(|c| c.status).collect();
        assert_eq!(statuses, ColumnStatus::ALL.to_vec());
        let positions: Vec<_> = columns.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn list_for_user_unions_owned_and_member_boards() {
        let db = crate::DBService::new_in_memory().await.unwrap();
        let alice = seed_user(&db.pool, "alice@example.com").await;
        let bob = seed_user(&db.pool, "bob@example.com").await;

        Board::create(&db.pool, "Beta", alice.id, &[]).await.unwrap();
        Board::create(&db.pool, "Alpha", bob.id, &[alice.id]).await.unwrap();
        Board::create(&db.pool, "Hidden", bob.id, &[]).await.unwrap();

        let boards = Board::list_for_user(&db.pool, alice.id).await.unwrap();
        let titles: Vec<_> = boards.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Beta"]);
    }

    #[tokio::test]
    async fn create_rolls_back_when_a_member_is_unknown() {
        let db = crate::DBService::new_in_memory().await.unwrap();
        let owner = seed_user(&db.pool, "owner@example.com").await;

        let result = Board::create(&db.pool, "Sprint", owner.id, &[Uuid::new_v4()]).await;
        assert!(result.is_err());

        // nothing partially created
        let boards = Board::list_for_user(&db.pool, owner.id).await.unwrap();
        assert!(boards.is_empty());
    }

    #[tokio::test]
    async fn replace_members_swaps_the_whole_set() {
        let db = crate::DBService::new_in_memory().await.unwrap();
        let owner = seed_user(&db.pool, "owner@example.com").await;
        let carol = seed_user(&db.pool, "carol@example.com").await;

        let board = Board::create(&db.pool, "Sprint", owner.id, &[]).await.unwrap();
        Board::replace_members(&db.pool, board.id, &[carol.id]).await.unwrap();

        assert!(!Board::has_member(&db.pool, board.id, owner.id).await.unwrap());
        assert!(Board::has_member(&db.pool, board.id, carol.id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_cascades_to_columns_and_members() {
        let db = crate::DBService::new_in_memory().await.unwrap();
        let owner = seed_user(&db.pool, "owner@example.com").await;
        let board = Board::create(&db.pool, "Sprint", owner.id, &[]).await.unwrap();

        assert_eq!(Board::delete(&db.pool, board.id).await.unwrap(), 1);
        let columns = Column::list_for_board(&db.pool, board.id).await.unwrap();
        assert!(columns.is_empty());
        assert!(!Board::has_member(&db.pool, board.id, owner.id).await.unwrap());
    }
}
