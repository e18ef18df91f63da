use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;

use crate::{AppState, auth::require_session};

mod auth;
mod boards;
mod columns;
mod comments;
mod dashboard;
mod tasks;

pub fn router(state: AppState) -> Router {
    let public = Router::<AppState>::new()
        .route("/api/registration", post(auth::register))
        .route("/api/login", post(auth::login));

    let protected = Router::<AppState>::new()
        .route("/api/email-check", get(auth::email_check))
        .route(
            "/api/boards",
            get(boards::list_boards).post(boards::create_board),
        )
        .route(
            "/api/boards/{board_id}",
            get(boards::get_board)
                .patch(boards::update_board)
                .delete(boards::delete_board),
        )
        .route("/api/columns", get(columns::list_columns))
        .route(
            "/api/columns/{column_id}",
            get(columns::get_column).patch(columns::update_column),
        )
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route("/api/tasks/assigned-to-me", get(tasks::assigned_to_me))
        .route("/api/tasks/reviewing", get(tasks::reviewing))
        .route(
            "/api/tasks/{task_id}",
            get(tasks::get_task)
                .put(tasks::replace_task)
                .patch(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route(
            "/api/tasks/{task_id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/api/tasks/{task_id}/comments/{comment_id}",
            delete(comments::delete_comment),
        )
        .route("/api/dashboard/stats", get(dashboard::stats))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::<AppState>::new()
        .route("/health", get(health))
        .merge(public)
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
