use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("a user with this email already exists")]
    EmailTaken,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compact user representation embedded in board/task payloads.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub fullname: String,
}

/// First/last name joined with a space, falling back to the username when
/// both are blank.
pub fn display_name(first_name: &str, last_name: &str, username: &str) -> String {
    let name = format!("{} {}", first_name.trim(), last_name.trim());
    let name = name.trim();
    if name.is_empty() {
        username.to_string()
    } else {
        name.to_string()
    }
}

impl User {
    pub fn full_name(&self) -> String {
        display_name(&self.first_name, &self.last_name, &self.username)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email.clone(),
            fullname: self.full_name(),
        }
    }
}

impl UserSummary {
    /// Assemble from nullable join columns; `None` when the joined row was
    /// absent entirely.
    pub(crate) fn from_join(
        id: Option<Uuid>,
        username: Option<String>,
        email: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Option<Self> {
        let id = id?;
        let username = username.unwrap_or_default();
        let fullname = display_name(
            first_name.as_deref().unwrap_or(""),
            last_name.as_deref().unwrap_or(""),
            &username,
        );
        Some(Self {
            id,
            email: email.unwrap_or_default(),
            fullname,
        })
    }
}

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password_hash, created_at, updated_at";

impl User {
    /// Create a user with a username derived from the email local part,
    /// suffixed with a counter until unique.
    pub async fn register(
        pool: &SqlitePool,
        email: &str,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
    ) -> Result<Self, UserError> {
        if Self::email_exists(pool, email).await? {
            return Err(UserError::EmailTaken);
        }

        let base = email.split('@').next().unwrap_or("").trim().to_string();
        let base = if base.is_empty() {
            "user".to_string()
        } else {
            base
        };
        let mut username = base.clone();
        let mut counter = 1;
        while Self::username_exists(pool, &username).await? {
            username = format!("{base}{counter}");
            counter += 1;
        }

        let now = Utc::now();
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, email, first_name, last_name, password_hash, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&username)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err, "users.email") {
                UserError::EmailTaken
            } else {
                UserError::Database(err)
            }
        })
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Email lookup is case-insensitive, matching the unique constraint.
    pub async fn find_by_email(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 COLLATE NOCASE"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub async fn email_exists(pool: &SqlitePool, email: &str) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE email = $1 COLLATE NOCASE",
        )
        .bind(email)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    async fn username_exists(pool: &SqlitePool, username: &str) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(pool)
            .await?;
        Ok(count > 0)
    }
}

fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err.code().as_deref() == Some("2067") && db_err.message().contains(constraint)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_username() {
        assert_eq!(display_name("Ada", "Lovelace", "ada"), "Ada Lovelace");
        assert_eq!(display_name("Ada", "", "ada"), "Ada");
        assert_eq!(display_name("", "", "ada"), "ada");
        assert_eq!(display_name("  ", "  ", "ada"), "ada");
    }

    #[tokio::test]
    async fn register_derives_unique_usernames() {
        let db = crate::DBService::new_in_memory().await.unwrap();
        let first = User::register(&db.pool, "ada@example.com", "Ada", "Lovelace", "hash")
            .await
            .unwrap();
        let second = User::register(&db.pool, "ada@other.com", "Ada", "Byron", "hash")
            .await
            .unwrap();
        assert_eq!(first.username, "ada");
        assert_eq!(second.username, "ada1");
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email_case_insensitive() {
        let db = crate::DBService::new_in_memory().await.unwrap();
        User::register(&db.pool, "ada@example.com", "Ada", "Lovelace", "hash")
            .await
            .unwrap();
        let err = User::register(&db.pool, "ADA@Example.COM", "A", "B", "hash")
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::EmailTaken));
    }
}
