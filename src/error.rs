use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Invalid {0}")]
    InvalidReference(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("You have already created a notification for this bus and stop.")]
    DuplicateBooking,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl utoipa::ToSchema for AppError {
    fn name() -> std::borrow::Cow<'static, str> {
        "ErrorResponse".into()
    }
}

impl utoipa::PartialSchema for AppError {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        ErrorResponse::schema()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_string()),
            AppError::InvalidReference(field) => {
                (StatusCode::BAD_REQUEST, format!("Invalid {}", field))
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            // The passenger app surfaces duplicate bookings the same way as
            // any other rejected booking, so this answers 400 rather than 409.
            err @ AppError::DuplicateBooking => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({
            "error": error_message,
        });

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
