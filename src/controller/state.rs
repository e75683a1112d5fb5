use crate::models::task::Task;

/// Everything the list view renders. Only [`super::ListController`] mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListState {
    /// Client-side copy of the store's list, in the order it was last fetched.
    pub tasks: Vec<Task>,
    pub loading: bool,
    pub error: Option<String>,
    pub add_form_open: bool,
    /// At most one task is being edited at a time.
    pub editing: Option<EditDraft>,
}

impl ListState {
    pub fn task(&self, task_id: i64) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn is_editing(&self, task_id: i64) -> bool {
        self.editing.as_ref().is_some_and(|draft| draft.id == task_id)
    }
}

/// Uncommitted edits of one task, kept apart from the list itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub id: i64,
    pub title: String,
    pub description: String,
}

/// Input of the add form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}
