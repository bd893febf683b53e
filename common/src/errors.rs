//! Application error type.
//!
//! Every handler returns `AppResult<T>`; the error side is rendered as
//! `{"error": <message>, "code": <CODE>}` with the matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::ErrorBody;

/// Message returned when a service name is already taken.
pub const SERVICE_EXISTS_MESSAGE: &str = "Сервис с таким названием уже существует";

/// Generic message for storage failures; the details only go to the logs.
pub const DATABASE_ERROR_MESSAGE: &str = "Ошибка выполнения запроса к базе данных";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    InvalidFields(#[from] validator::ValidationErrors),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Service point not found: {0}")]
    ServicePointNotFound(i32),

    #[error("Parameter {param_id} not found on service point {point_id}")]
    ParameterNotFound { point_id: i32, param_id: i32 },

    #[error("Service already exists: {0}")]
    ServiceExists(String),

    #[error("Type '{0}' not found")]
    ParameterTypeNotFound(String),

    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Image error: {0}")]
    Image(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidFields(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ServiceNotFound(_)
            | AppError::ServicePointNotFound(_)
            | AppError::ParameterNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::ServiceExists(_) => StatusCode::CONFLICT,
            AppError::ParameterTypeNotFound(_)
            | AppError::DatabaseConnection(_)
            | AppError::Database(_)
            | AppError::Image(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidFields(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::ServiceNotFound(_) => "SERVICE_NOT_FOUND",
            AppError::ServicePointNotFound(_) => "SERVICE_POINT_NOT_FOUND",
            AppError::ParameterNotFound { .. } => "PARAMETER_NOT_FOUND",
            AppError::ServiceExists(_) => "SERVICE_EXISTS",
            AppError::ParameterTypeNotFound(_) => "PARAMETER_TYPE_NOT_FOUND",
            AppError::DatabaseConnection(_) | AppError::Database(_) => "DATABASE_ERROR",
            AppError::Image(_) => "IMAGE_ERROR",
            AppError::Io(_) => "INTERNAL_ERROR",
        }
    }

    /// Message shown to the client.
    fn public_message(&self) -> String {
        match self {
            AppError::ServiceExists(_) => SERVICE_EXISTS_MESSAGE.to_string(),
            AppError::DatabaseConnection(_) | AppError::Database(_) => {
                DATABASE_ERROR_MESSAGE.to_string()
            }
            AppError::Io(_) => "Internal Server Error".to_string(),
            AppError::Image(_) => "Failed to read or store service image".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "request rejected");
        }

        let mut body = ErrorBody::new(self.public_message(), self.code());
        if let AppError::InvalidFields(errors) = &self {
            if let Ok(details) = serde_json::to_value(errors) {
                body = body.with_details(details);
            }
        }
        (status, Json(body)).into_response()
    }
}
