use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::user::User;

/// Opaque session token. One row per user, reused across logins.
#[derive(Debug, Clone, FromRow)]
pub struct SessionToken {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl SessionToken {
    pub async fn find_by_user(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, SessionToken>(
            "SELECT token, user_id, created_at FROM tokens WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn insert(
        pool: &SqlitePool,
        token: &str,
        user_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SessionToken>(
            "INSERT INTO tokens (token, user_id, created_at)
             VALUES ($1, $2, $3)
             RETURNING token, user_id, created_at",
        )
        .bind(token)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Resolve the user a bearer token belongs to.
    pub async fn find_user(pool: &SqlitePool, token: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT u.id, u.username, u.email, u.first_name, u.last_name,
                    u.password_hash, u.created_at, u.updated_at
             FROM tokens t
             JOIN users u ON u.id = t.user_id
             WHERE t.token = $1",
        )
        .bind(token)
        .fetch_optional(pool)
        .await
    }
}
