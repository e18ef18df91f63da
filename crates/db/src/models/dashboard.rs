use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Per-user dashboard counters. Four independent snapshots computed at
/// request time; nothing is cached.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub boards_member_of: i64,
    pub tasks_assigned_to_me: i64,
    pub urgent_tasks_count: i64,
    pub done_last_14_days: i64,
}

impl DashboardStats {
    /// `now` is passed in so the windows are testable.
    pub async fn for_user(
        pool: &SqlitePool,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        let today = now.date_naive();
        let upcoming = today + Duration::days(7);
        let two_weeks_ago = now - Duration::days(14);

        let boards_member_of = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM board_members WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        let tasks_assigned_to_me = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tasks t
             JOIN board_members m ON m.board_id = t.board_id AND m.user_id = $1
             WHERE t.assignee_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        let urgent_tasks_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tasks t
             JOIN board_members m ON m.board_id = t.board_id AND m.user_id = $1
             JOIN columns c ON c.id = t.column_id
             WHERE t.assignee_id = $1
               AND c.status = 'TODO'
               AND t.priority IN ('HIGH', 'CRITICAL')
               AND date(t.due_date) BETWEEN date($2) AND date($3)",
        )
        .bind(user_id)
        .bind(today)
        .bind(upcoming)
        .fetch_one(pool)
        .await?;

        let done_last_14_days = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tasks t
             JOIN board_members m ON m.board_id = t.board_id AND m.user_id = $1
             JOIN columns c ON c.id = t.column_id
             WHERE t.assignee_id = $1
               AND c.status = 'DONE'
               AND t.completed_at IS NOT NULL
               AND datetime(t.completed_at) >= datetime($2)",
        )
        .bind(user_id)
        .bind(two_weeks_ago)
        .fetch_one(pool)
        .await?;

        Ok(DashboardStats {
            boards_member_of,
            tasks_assigned_to_me,
            urgent_tasks_count,
            done_last_14_days,
        })
    }
}
