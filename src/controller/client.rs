use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::response::{ErrorResponse, Response};
use crate::models::task::{CreateTaskRequest, Task, UpdateTaskRequest};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message} ({status})")]
    Status { status: StatusCode, message: String },
}

/// The Gateway's HTTP contract as seen from the client side.
#[async_trait]
pub trait TodoApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Task>, ApiError>;
    async fn create(&self, request: &CreateTaskRequest) -> Result<Task, ApiError>;
    async fn get(&self, task_id: i64) -> Result<Task, ApiError>;
    async fn update(&self, task_id: i64, request: &UpdateTaskRequest) -> Result<Task, ApiError>;
    async fn delete(&self, task_id: i64) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpTodoApi {
    client: Client,
    base_url: String,
}

impl HttpTodoApi {
    /// `base_url` is the API root, e.g. `http://127.0.0.1:8080/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn todos_url(&self) -> String {
        format!("{}/todos", self.base_url)
    }

    fn todo_url(&self, task_id: i64) -> String {
        format!("{}/todos/{}", self.base_url, task_id)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }
    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("Unknown error").to_string(),
    };
    Err(ApiError::Status { status, message })
}

#[async_trait]
impl TodoApi for HttpTodoApi {
    async fn list(&self) -> Result<Vec<Task>, ApiError> {
        let response = self.client.get(self.todos_url()).send().await?;
        decode(response).await
    }

    async fn create(&self, request: &CreateTaskRequest) -> Result<Task, ApiError> {
        let response = self
            .client
            .post(self.todos_url())
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    async fn get(&self, task_id: i64) -> Result<Task, ApiError> {
        let response = self.client.get(self.todo_url(task_id)).send().await?;
        decode(response).await
    }

    async fn update(&self, task_id: i64, request: &UpdateTaskRequest) -> Result<Task, ApiError> {
        let response = self
            .client
            .put(self.todo_url(task_id))
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    async fn delete(&self, task_id: i64) -> Result<(), ApiError> {
        let response = self.client.delete(self.todo_url(task_id)).send().await?;
        let confirmation: Response = decode(response).await?;
        tracing::debug!(task_id, message = %confirmation.message, "task deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::Arc;

    use actix_web::{web, App, HttpServer};

    use super::*;
    use crate::api;
    use crate::controller::{ListController, TaskDraft};
    use crate::repository::memory::InMemoryTaskRepository;
    use crate::repository::TaskRepository;

    fn local_api(port: u16) -> HttpTodoApi {
        let client = Client::builder().no_proxy().build().unwrap();
        HttpTodoApi::with_client(client, format!("http://127.0.0.1:{port}/api/"))
    }

    #[actix_web::test]
    async fn test_controller_against_running_server() {
        let repo: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::new());
        let app_data = web::Data::from(repo);
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(app_data.clone())
                .configure(api::config)
                .default_service(web::route().to(api::not_found))
        })
        .workers(1)
        .listen(listener)
        .unwrap()
        .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        let controller = ListController::new(local_api(port));
        controller.refresh().await.unwrap();
        assert!(controller.state().tasks.is_empty());

        controller.add(TaskDraft::new("first", "")).await.unwrap();
        controller.add(TaskDraft::new("second", "with notes")).await.unwrap();
        let state = controller.state();
        let titles: Vec<&str> = state.tasks.iter().map(|task| task.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);
        assert_eq!(state.tasks[0].description.as_deref(), Some("with notes"));

        let second = state.tasks[0].id;
        controller.toggle_complete(second).await.unwrap();
        controller.refresh().await.unwrap();
        let state = controller.state();
        assert_eq!(state.tasks[1].id, second);
        assert!(state.tasks[1].completed);

        controller.delete(second).await.unwrap();
        let fetched = controller.api().get(second).await.unwrap_err();
        match fetched {
            ApiError::Status { status, message } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "Task not found");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = controller
            .api()
            .update(state.tasks[0].id, &UpdateTaskRequest {
                title: Some(Some(String::new())),
                ..UpdateTaskRequest::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Title cannot be empty (400 Bad Request)");

        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn test_unreachable_server_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = local_api(port).list().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
