use std::sync::Arc;

use db::DBService;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    db: DBService,
}

impl AppState {
    pub fn new(db: DBService) -> Self {
        Self {
            inner: Arc::new(AppStateInner { db }),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.inner.db.pool
    }
}
