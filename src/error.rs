use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;

use crate::lifecycle::{ComplaintStatus, TransitionError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Used both for genuinely missing records and for records outside the
    /// caller's visible set, so callers cannot probe for existence.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "resource not found")
    }

    pub fn invalid_transition(from: ComplaintStatus, to: ComplaintStatus) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            format!("invalid transition from '{from}' to '{to}'"),
        )
    }

    pub fn already_assigned() -> Self {
        Self::new(StatusCode::CONFLICT, "complaint is already assigned")
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal<E: Display>(error: E) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Json(ErrorEnvelope {
            success: false,
            message: self.message,
            data: Value::Null,
        });
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    message: String,
    data: Value,
}

impl From<TransitionError> for AppError {
    fn from(value: TransitionError) -> Self {
        match value {
            TransitionError::Invalid { from, to } => AppError::invalid_transition(from, to),
            TransitionError::RoleNotAllowed { .. } | TransitionError::NotAssignee { .. } => {
                AppError::forbidden(value.to_string())
            }
        }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(value: diesel::result::Error) -> Self {
        match value {
            diesel::result::Error::NotFound => AppError::not_found(),
            _ => AppError::internal(value),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        AppError::internal(value)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError::internal(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::internal(value)
    }
}
