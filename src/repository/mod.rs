use std::sync::Arc;

use thiserror::Error;

use crate::config::Config;
use crate::models::task::{NewTask, Task, TaskChanges};

pub mod database;
pub mod memory;
pub mod schema;

/// Failure reported by the backing store. The message is surfaced verbatim.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Query(#[from] diesel::result::Error),
    #[error("{0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("No task with id {0}")]
    NotFound(i64),
    #[error("{0}")]
    Unavailable(String),
}

/// Single-record operations the HTTP layer needs from a store.
///
/// Calls are blocking; handlers run them on the actix blocking pool.
pub trait TaskRepository: Send + Sync {
    /// All tasks, incomplete first, newest first within each group.
    fn list(&self) -> Result<Vec<Task>, StoreError>;

    fn get(&self, task_id: i64) -> Result<Option<Task>, StoreError>;

    fn insert(&self, task: NewTask) -> Result<Task, StoreError>;

    /// Applies only the fields present in `changes` and stamps `updated_at`.
    /// Fails with [`StoreError::NotFound`] when no row matches.
    fn update(&self, task_id: i64, changes: TaskChanges) -> Result<Task, StoreError>;

    /// Removing an id that does not exist is not an error.
    fn delete(&self, task_id: i64) -> Result<(), StoreError>;
}

/// Picks PostgreSQL when `DATABASE_URL` is configured, the in-memory store otherwise.
pub fn connect(config: &Config) -> Result<Arc<dyn TaskRepository>, StoreError> {
    match &config.database_url {
        Some(url) => {
            tracing::info!(pool_size = config.pool_size, "using PostgreSQL task store");
            Ok(Arc::new(database::PgTaskRepository::new(url, config.pool_size)?))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, tasks are kept in memory only");
            Ok(Arc::new(memory::InMemoryTaskRepository::new()))
        }
    }
}
