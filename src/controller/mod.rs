//! Client-side state manager for the todo list view.
//!
//! [`ListController`] owns the only writable copy of [`ListState`] and
//! publishes every change through a `tokio::sync::watch` channel. Toggle and
//! delete are applied locally before the Gateway answers and rolled back if
//! it refuses; add and edit wait for the Gateway and then reload the list.
//!
//! The list is never re-sorted locally. A task toggled to completed keeps its
//! position until the next [`ListController::refresh`].

use thiserror::Error;
use tokio::sync::watch;

use crate::models::task::{CreateTaskRequest, UpdateTaskRequest};

pub mod client;
pub mod state;

pub use client::{ApiError, HttpTodoApi, TodoApi};
pub use state::{EditDraft, ListState, TaskDraft};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Title is required")]
    BlankTitle,
    #[error("Task {0} is not in the list")]
    UnknownTask(i64),
    #[error("No task is being edited")]
    NotEditing,
    #[error("{context}: {source}")]
    Api {
        context: &'static str,
        source: ApiError,
    },
}

pub struct ListController<A> {
    api: A,
    state: watch::Sender<ListState>,
}

impl<A: TodoApi> ListController<A> {
    pub fn new(api: A) -> Self {
        let (state, _) = watch::channel(ListState::default());
        Self { api, state }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// A receiver that observes every state change from now on.
    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ListState {
        self.state.borrow().clone()
    }

    fn completed_of(&self, task_id: i64) -> Option<bool> {
        self.state.borrow().task(task_id).map(|task| task.completed)
    }

    fn draft(&self) -> Option<EditDraft> {
        self.state.borrow().editing.clone()
    }

    fn set_completed(&self, task_id: i64, completed: bool) {
        self.state.send_modify(|state| {
            if let Some(task) = state.tasks.iter_mut().find(|task| task.id == task_id) {
                task.completed = completed;
            }
        });
    }

    fn fail(&self, context: &'static str, source: ApiError) -> Result<(), ControllerError> {
        let err = ControllerError::Api { context, source };
        let message = err.to_string();
        tracing::warn!(error = %message, "todo request failed");
        self.state.send_modify(|state| state.error = Some(message));
        Err(err)
    }

    /// Replaces the local list with the Gateway's. On failure the previous
    /// list stays as it was.
    pub async fn refresh(&self) -> Result<(), ControllerError> {
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
        let result = self.api.list().await;
        self.state.send_modify(|state| state.loading = false);
        match result {
            Ok(tasks) => {
                tracing::debug!(count = tasks.len(), "todo list refreshed");
                self.state.send_modify(|state| state.tasks = tasks);
                Ok(())
            }
            Err(source) => self.fail("Failed to fetch todos", source),
        }
    }

    pub fn open_add_form(&self) {
        self.state.send_modify(|state| state.add_form_open = true);
    }

    pub fn close_add_form(&self) {
        self.state.send_modify(|state| state.add_form_open = false);
    }

    pub fn toggle_add_form(&self) {
        self.state
            .send_modify(|state| state.add_form_open = !state.add_form_open);
    }

    /// Creates a task, then reloads the whole list so the store decides
    /// where it goes. A blank title never reaches the Gateway.
    pub async fn add(&self, draft: TaskDraft) -> Result<(), ControllerError> {
        if draft.title.trim().is_empty() {
            return Err(ControllerError::BlankTitle);
        }
        let description = Some(draft.description).filter(|description| !description.is_empty());
        let request = CreateTaskRequest::new(draft.title, description);
        match self.api.create(&request).await {
            Ok(task) => {
                tracing::debug!(task_id = task.id, "todo added");
                self.close_add_form();
                self.refresh().await
            }
            Err(source) => self.fail("Failed to add todo", source),
        }
    }

    /// Flips `completed` locally, then asks the Gateway to do the same.
    /// Only this task is reverted if the Gateway refuses.
    pub async fn toggle_complete(&self, task_id: i64) -> Result<(), ControllerError> {
        let previous = self
            .completed_of(task_id)
            .ok_or(ControllerError::UnknownTask(task_id))?;
        self.set_completed(task_id, !previous);

        let request = UpdateTaskRequest::completed(!previous);
        match self.api.update(task_id, &request).await {
            Ok(_) => Ok(()),
            Err(source) => {
                self.set_completed(task_id, previous);
                self.fail("Failed to update todo", source)
            }
        }
    }

    /// Starts editing `task_id`, replacing any draft already open.
    pub fn begin_edit(&self, task_id: i64) -> Result<(), ControllerError> {
        let draft = {
            let state = self.state.borrow();
            let task = state
                .task(task_id)
                .ok_or(ControllerError::UnknownTask(task_id))?;
            EditDraft {
                id: task.id,
                title: task.title.clone(),
                description: task.description.clone().unwrap_or_default(),
            }
        };
        self.state.send_modify(|state| state.editing = Some(draft));
        Ok(())
    }

    pub fn update_draft(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<(), ControllerError> {
        let (title, description) = (title.into(), description.into());
        let mut editing = false;
        self.state.send_if_modified(|state| match state.editing.as_mut() {
            Some(draft) => {
                draft.title = title;
                draft.description = description;
                editing = true;
                true
            }
            None => false,
        });
        if editing {
            Ok(())
        } else {
            Err(ControllerError::NotEditing)
        }
    }

    pub fn cancel_edit(&self) {
        self.state.send_modify(|state| state.editing = None);
    }

    /// Sends the draft's title and description. Leaves edit mode and reloads
    /// on success; keeps the draft open on failure.
    pub async fn save_edit(&self) -> Result<(), ControllerError> {
        let draft = self.draft().ok_or(ControllerError::NotEditing)?;
        if draft.title.trim().is_empty() {
            return Err(ControllerError::BlankTitle);
        }
        let task_id = draft.id;
        let request = UpdateTaskRequest::content(draft.title, draft.description);
        match self.api.update(task_id, &request).await {
            Ok(_) => {
                self.state.send_modify(|state| {
                    if state.is_editing(task_id) {
                        state.editing = None;
                    }
                });
                self.refresh().await
            }
            Err(source) => self.fail("Failed to update todo", source),
        }
    }

    /// Removes the task locally, then asks the Gateway to delete it. The
    /// whole list as it was beforehand is restored if the Gateway refuses.
    pub async fn delete(&self, task_id: i64) -> Result<(), ControllerError> {
        let mut snapshot = Vec::new();
        self.state.send_modify(|state| {
            snapshot = state.tasks.clone();
            state.tasks.retain(|task| task.id != task_id);
        });
        match self.api.delete(task_id).await {
            Ok(()) => Ok(()),
            Err(source) => {
                self.state.send_modify(|state| state.tasks = snapshot);
                self.fail("Failed to delete todo", source)
            }
        }
    }

    pub fn dismiss_error(&self) {
        self.state.send_modify(|state| state.error = None);
    }
}
