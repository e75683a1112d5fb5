use actix_web::error::JsonPayloadError;
use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse, Responder};

use crate::api::error::{GatewayError, Operation};
use crate::models::response::{ErrorResponse, Response};
use crate::models::task::{CreateTaskRequest, NewTask, TaskChanges, UpdateTaskRequest};
use crate::repository::TaskRepository;

type Repository = web::Data<dyn TaskRepository>;

fn parse_id(raw: &str) -> Result<i64, GatewayError> {
    raw.parse::<i64>().map_err(|_| GatewayError::MalformedId)
}

fn is_blank(title: &str) -> bool {
    title.trim().is_empty()
}

/// Runs a store call on the blocking pool.
async fn run_blocking<T, F>(repo: Repository, call: F) -> Result<T, GatewayError>
where
    F: FnOnce(&dyn TaskRepository) -> Result<T, GatewayError> + Send + 'static,
    T: Send + 'static,
{
    let repo = repo.into_inner();
    web::block(move || call(repo.as_ref()))
        .await
        .map_err(|err| GatewayError::Internal(err.to_string()))?
}

#[get("/todos")]
pub async fn get_todos(repo: Repository) -> Result<HttpResponse, GatewayError> {
    let tasks = run_blocking(repo, |repo| {
        repo.list().map_err(GatewayError::store(Operation::List))
    })
    .await?;
    Ok(HttpResponse::Ok().json(tasks))
}

#[post("/todos")]
pub async fn create_todo(
    repo: Repository,
    new_todo: web::Json<CreateTaskRequest>,
) -> Result<HttpResponse, GatewayError> {
    let CreateTaskRequest { title, description } = new_todo.into_inner();
    let title = title
        .filter(|title| !is_blank(title))
        .ok_or(GatewayError::Validation("Title is required"))?;
    let task = run_blocking(repo, move |repo| {
        repo.insert(NewTask { title, description })
            .map_err(GatewayError::store(Operation::Create))
    })
    .await?;
    tracing::info!(task_id = task.id, "created task");
    Ok(HttpResponse::Created().json(task))
}

#[get("/todos/{id}")]
pub async fn get_todo_by_id(
    repo: Repository,
    id: web::Path<String>,
) -> Result<HttpResponse, GatewayError> {
    let task_id = parse_id(&id)?;
    let task = run_blocking(repo, move |repo| {
        repo.get(task_id).map_err(GatewayError::store(Operation::Get))
    })
    .await?
    .ok_or(GatewayError::NotFound)?;
    Ok(HttpResponse::Ok().json(task))
}

#[put("/todos/{id}")]
pub async fn update_todo_by_id(
    repo: Repository,
    id: web::Path<String>,
    updated_todo: web::Json<UpdateTaskRequest>,
) -> Result<HttpResponse, GatewayError> {
    let task_id = parse_id(&id)?;
    let request = updated_todo.into_inner();
    // a supplied title must be a non-blank string; `null` counts as blank
    if let Some(title) = &request.title {
        if title.as_deref().map_or(true, is_blank) {
            return Err(GatewayError::Validation("Title cannot be empty"));
        }
    }
    let changes = TaskChanges::from(request);
    let task = run_blocking(repo, move |repo| {
        repo.update(task_id, changes)
            .map_err(GatewayError::store(Operation::Update))
    })
    .await?;
    tracing::info!(task_id, completed = task.completed, "updated task");
    Ok(HttpResponse::Ok().json(task))
}

#[delete("/todos/{id}")]
pub async fn delete_todo_by_id(
    repo: Repository,
    id: web::Path<String>,
) -> Result<HttpResponse, GatewayError> {
    let task_id = parse_id(&id)?;
    run_blocking(repo, move |repo| {
        repo.delete(task_id).map_err(GatewayError::store(Operation::Delete))
    })
    .await?;
    tracing::info!(task_id, "deleted task");
    Ok(HttpResponse::Ok().json(Response::new("Deleted successfully")))
}

#[get("/health")]
pub async fn healthcheck() -> impl Responder {
    HttpResponse::Ok().json(Response::new("Everything is working fine"))
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        error: "Resource not found".to_string(),
    })
}

// Undecodable bodies are unexpected input, not validation failures.
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    GatewayError::Internal(err.to_string()).into()
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .service(get_todos)
            .service(create_todo)
            .service(get_todo_by_id)
            .service(update_todo_by_id)
            .service(delete_todo_by_id),
    )
    .service(healthcheck);
}
