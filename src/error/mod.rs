use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the HTTP layer.
///
/// Preview extraction itself never fails; only malformed requests end up here.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error")]
    Internal,
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = e.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        AppError::Validation(
            fields
                .into_iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |err| match &err.message {
                        Some(message) => message.to_string(),
                        None => format!("{field} is invalid"),
                    })
                })
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message): (StatusCode, String) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal => {
                tracing::error!("Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
