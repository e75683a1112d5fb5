use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};

use crate::models::task::{NewTask, Task, TaskChanges};
use crate::repository::schema::todos;
use crate::repository::{StoreError, TaskRepository};

type DBPool = r2d2::Pool<ConnectionManager<PgConnection>>;

#[derive(Debug, Clone)]
pub struct PgTaskRepository {
    pool: DBPool,
}

impl PgTaskRepository {
    pub fn new(database_url: &str, pool_size: u32) -> Result<Self, StoreError> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool: DBPool = r2d2::Pool::builder().max_size(pool_size).build(manager)?;
        Ok(PgTaskRepository { pool })
    }
}

impl TaskRepository for PgTaskRepository {
    fn list(&self) -> Result<Vec<Task>, StoreError> {
        let mut conn = self.pool.get()?;
        let tasks = todos::table
            .order((
                todos::completed.asc(),
                todos::created_at.desc(),
                todos::id.desc(),
            ))
            .load::<Task>(&mut conn)?;
        Ok(tasks)
    }

    fn get(&self, task_id: i64) -> Result<Option<Task>, StoreError> {
        let mut conn = self.pool.get()?;
        let task = todos::table
            .find(task_id)
            .first::<Task>(&mut conn)
            .optional()?;
        Ok(task)
    }

    fn insert(&self, task: NewTask) -> Result<Task, StoreError> {
        let mut conn = self.pool.get()?;
        let task = diesel::insert_into(todos::table)
            .values(&task)
            .get_result::<Task>(&mut conn)?;
        Ok(task)
    }

    fn update(&self, task_id: i64, changes: TaskChanges) -> Result<Task, StoreError> {
        let mut conn = self.pool.get()?;
        diesel::update(todos::table.find(task_id))
            .set((&changes, todos::updated_at.eq(Utc::now())))
            .get_result::<Task>(&mut conn)
            .optional()?
            .ok_or(StoreError::NotFound(task_id))
    }

    fn delete(&self, task_id: i64) -> Result<(), StoreError> {
        let mut conn = self.pool.get()?;
        let count = diesel::delete(todos::table.find(task_id)).execute(&mut conn)?;
        tracing::debug!(task_id, count, "deleted task rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use diesel::sql_query;
    use testcontainers::core::{IntoContainerPort, WaitFor};
    use testcontainers::runners::AsyncRunner;
    use testcontainers::{ContainerAsync, GenericImage, ImageExt};

    use super::*;

    const CREATE_TABLE: &str = "CREATE TABLE todos (
        id          BIGSERIAL PRIMARY KEY,
        title       VARCHAR NOT NULL,
        description TEXT,
        completed   BOOLEAN NOT NULL DEFAULT false,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )";

    async fn start_postgres() -> (ContainerAsync<GenericImage>, PgTaskRepository) {
        let container = GenericImage::new("postgres", "16-alpine")
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stderr(
                "database system is ready to accept connections",
            ))
            .with_env_var("POSTGRES_PASSWORD", "postgres")
            .start()
            .await
            .expect("Failed to start postgres container");
        let host = container.get_host().await.unwrap();
        let port = container.get_host_port_ipv4(5432.tcp()).await.unwrap();

        // the pool retries until the server accepts TCP connections
        let repo = PgTaskRepository::new(
            &format!("postgres://postgres:postgres@{host}:{port}/postgres"),
            2,
        )
        .unwrap();
        sql_query(CREATE_TABLE)
            .execute(&mut repo.pool.get().unwrap())
            .unwrap();
        (container, repo)
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
    }

    fn seed(repo: &PgTaskRepository, title: &str, completed: bool, created_at: DateTime<Utc>) -> Task {
        let task = repo
            .insert(NewTask {
                title: title.to_string(),
                description: Some(format!("{title} notes")),
            })
            .unwrap();
        diesel::update(todos::table.find(task.id))
            .set((
                todos::completed.eq(completed),
                todos::created_at.eq(created_at),
                todos::updated_at.eq(created_at),
            ))
            .get_result::<Task>(&mut repo.pool.get().unwrap())
            .unwrap()
    }

    #[tokio::test]
    #[ignore = "starts a PostgreSQL container, needs a Docker daemon"]
    async fn test_list_orders_by_status_then_recency() {
        let (_node, repo) = start_postgres().await;
        let old_open = seed(&repo, "old open", false, at(1));
        let new_open = seed(&repo, "new open", false, at(9));
        let old_done = seed(&repo, "old done", true, at(5));
        let new_done = seed(&repo, "new done", true, at(30));
        let twin = seed(&repo, "twin of new open", false, at(9));

        let ids: Vec<i64> = repo.list().unwrap().iter().map(|task| task.id).collect();
        assert_eq!(
            ids,
            vec![twin.id, new_open.id, old_open.id, new_done.id, old_done.id]
        );
    }

    #[tokio::test]
    #[ignore = "starts a PostgreSQL container, needs a Docker daemon"]
    async fn test_insert_uses_store_defaults() {
        let (_node, repo) = start_postgres().await;
        let task = repo
            .insert(NewTask {
                title: "Buy milk".to_string(),
                description: None,
            })
            .unwrap();
        assert!(task.id > 0);
        assert_eq!(task.description, None);
        assert!(!task.completed);
        assert_eq!(repo.get(task.id).unwrap(), Some(task));
    }

    #[tokio::test]
    #[ignore = "starts a PostgreSQL container, needs a Docker daemon"]
    async fn test_update_is_partial_and_stamps_updated_at() {
        let (_node, repo) = start_postgres().await;
        let task = seed(&repo, "X", false, at(0));

        let updated = repo
            .update(
                task.id,
                TaskChanges {
                    completed: Some(true),
                    ..TaskChanges::default()
                },
            )
            .unwrap();
        assert!(updated.completed);
        assert_eq!(updated.title, "X");
        assert_eq!(updated.description.as_deref(), Some("X notes"));
        assert_eq!(updated.created_at, at(0));
        assert!(updated.updated_at > at(0));

        let cleared = repo
            .update(
                task.id,
                TaskChanges {
                    description: Some(None),
                    ..TaskChanges::default()
                },
            )
            .unwrap();
        assert_eq!(cleared.description, None);
        assert_eq!(cleared.title, "X");
        assert!(cleared.completed);
    }

    #[tokio::test]
    #[ignore = "starts a PostgreSQL container, needs a Docker daemon"]
    async fn test_missing_rows() {
        let (_node, repo) = start_postgres().await;
        let task = seed(&repo, "gone soon", false, at(0));

        let err = repo.update(9_999, TaskChanges::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(9_999)));

        repo.delete(task.id).unwrap();
        assert_eq!(repo.get(task.id).unwrap(), None);
        // no existence check on delete
        repo.delete(task.id).unwrap();
        repo.delete(9_999).unwrap();
    }
}
