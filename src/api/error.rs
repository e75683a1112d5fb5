use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::response::ErrorResponse;
use crate::repository::StoreError;

/// The store call a failure came from; decides the status of a [`GatewayError::Store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Create,
    Get,
    Update,
    Delete,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("Invalid ID format")]
    MalformedId,
    #[error("Task not found")]
    NotFound,
    #[error("{source}")]
    Store {
        operation: Operation,
        source: StoreError,
    },
    /// The detail is logged, never returned to the caller.
    #[error("Internal Server Error")]
    Internal(String),
}

impl GatewayError {
    /// Rejections keep the store's message. A store that cannot be reached
    /// is an internal failure whatever the operation.
    pub fn store(operation: Operation) -> impl FnOnce(StoreError) -> Self {
        move |source| match source {
            StoreError::Pool(_) | StoreError::Unavailable(_) => {
                GatewayError::Internal(format!("{operation:?}: {source}"))
            }
            source => GatewayError::Store { operation, source },
        }
    }
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) | GatewayError::MalformedId => StatusCode::BAD_REQUEST,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::Store { operation, .. } => match operation {
                Operation::List | Operation::Create => StatusCode::INTERNAL_SERVER_ERROR,
                Operation::Get => StatusCode::NOT_FOUND,
                Operation::Update | Operation::Delete => StatusCode::BAD_REQUEST,
            },
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            GatewayError::Internal(detail) => {
                tracing::error!(detail = %detail, "request failed unexpectedly")
            }
            GatewayError::Store { operation, source } => {
                tracing::error!(?operation, error = %source, "store operation failed")
            }
            _ => tracing::debug!(error = %self, "request rejected"),
        }
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    use super::*;

    fn check_violation() -> StoreError {
        StoreError::Query(DieselError::DatabaseError(
            DatabaseErrorKind::CheckViolation,
            Box::new("new row violates check constraint".to_string()),
        ))
    }

    #[test]
    fn store_status_depends_on_operation() {
        let status = |operation| GatewayError::store(operation)(check_violation()).status_code();
        assert_eq!(status(Operation::List), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status(Operation::Create), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status(Operation::Get), StatusCode::NOT_FOUND);
        assert_eq!(status(Operation::Update), StatusCode::BAD_REQUEST);
        assert_eq!(status(Operation::Delete), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unreachable_store_is_internal_for_every_operation() {
        for operation in [
            Operation::List,
            Operation::Create,
            Operation::Get,
            Operation::Update,
            Operation::Delete,
        ] {
            let err = GatewayError::store(operation)(StoreError::Unavailable(
                "connection to server at 127.0.0.1, port 5432 failed".to_string(),
            ));
            assert!(matches!(err, GatewayError::Internal(_)));
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err.to_string(), "Internal Server Error");
        }
    }

    #[test]
    fn internal_error_hides_detail() {
        let err = GatewayError::Internal("connection reset by peer".to_string());
        assert_eq!(err.to_string(), "Internal Server Error");
    }
}
