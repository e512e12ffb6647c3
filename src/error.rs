use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::cart::CartError;
use crate::checkout::CheckoutError;
use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Backend failure detail goes to the log, not the client.
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Cart(CartError::NoSuchLine(_)) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Cart(_) => {
                tracing::error!(error = ?self, "cart persistence failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "cart persistence failed".to_string(),
                )
            }
            AppError::Checkout(CheckoutError::EmptyCart) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::Checkout(_) => {
                tracing::error!(error = ?self, "checkout failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "checkout failed".to_string())
            }
            AppError::DbError(_) | AppError::Internal(_) => {
                tracing::error!(error = ?self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData { error: message }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
