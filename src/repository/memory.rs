use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::models::task::{NewTask, Task, TaskChanges};
use crate::repository::{StoreError, TaskRepository};

struct State {
    tasks: Vec<Task>,
    next_id: i64,
}

/// Process-local store. Ids are sequential starting at 1.
pub struct InMemoryTaskRepository {
    state: Mutex<State>,
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::with_tasks(vec![])
    }

    /// Seeds the store with existing rows; new ids continue after the largest one.
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let next_id = tasks.iter().map(|task| task.id).max().unwrap_or(0) + 1;
        InMemoryTaskRepository {
            state: Mutex::new(State { tasks, next_id }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("task store lock poisoned".to_string()))
    }
}

impl TaskRepository for InMemoryTaskRepository {
    fn list(&self) -> Result<Vec<Task>, StoreError> {
        let mut tasks = self.lock()?.tasks.clone();
        tasks.sort_by(|a, b| {
            a.completed
                .cmp(&b.completed)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(tasks)
    }

    fn get(&self, task_id: i64) -> Result<Option<Task>, StoreError> {
        let state = self.lock()?;
        Ok(state.tasks.iter().find(|task| task.id == task_id).cloned())
    }

    fn insert(&self, task: NewTask) -> Result<Task, StoreError> {
        let mut state = self.lock()?;
        let now = Utc::now();
        let task = Task {
            id: state.next_id,
            title: task.title,
            description: task.description,
            completed: false,
            created_at: now,
            updated_at: now,
        };
        state.next_id += 1;
        state.tasks.push(task.clone());
        Ok(task)
    }

    fn update(&self, task_id: i64, changes: TaskChanges) -> Result<Task, StoreError> {
        let mut state = self.lock()?;
        let task = state
            .tasks
            .iter_mut()
            .find(|task| task.id == task_id)
            .ok_or(StoreError::NotFound(task_id))?;
        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(description) = changes.description {
            task.description = description;
        }
        if let Some(completed) = changes.completed {
            task.completed = completed;
        }
        task.updated_at = Utc::now(); // created_at is preserved
        Ok(task.clone())
    }

    fn delete(&self, task_id: i64) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.tasks.retain(|task| task.id != task_id);
        Ok(())
    }
}
