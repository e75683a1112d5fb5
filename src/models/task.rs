use chrono::{DateTime, Utc};
use diesel::{AsChangeset, Insertable, Queryable};
use serde::{Deserialize, Deserializer, Serialize};

/// A persisted to-do item. `id` and both timestamps are assigned by the store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Queryable)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/todos`.
///
/// `title` is optional at the wire level so that a missing title is reported
/// as a validation failure rather than a body decoding failure.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateTaskRequest {
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            title: Some(title.into()),
            description,
        }
    }
}

/// Body of `PUT /api/todos/{id}`. Every field is optional and an absent key
/// must stay absent all the way down to the store.
///
/// `title` and `description` distinguish "not supplied" (`None`) from "set to
/// null" (`Some(None)`). A null title is refused by the Gateway.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UpdateTaskRequest {
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateTaskRequest {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn content(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: Some(Some(title.into())),
            description: Some(Some(description.into())),
            completed: None,
        }
    }
}

// A key that is present (even as `null`) deserializes to `Some(..)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::repository::schema::todos)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
}

/// Partial update handed to the store. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, AsChangeset)]
#[diesel(table_name = crate::repository::schema::todos)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

impl From<UpdateTaskRequest> for TaskChanges {
    fn from(value: UpdateTaskRequest) -> Self {
        Self {
            title: value.title.flatten(),
            description: value.description,
            completed: value.completed,
        }
    }
}
