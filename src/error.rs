use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum AppError {
    /// Request body could not be decoded; carries the parser's message.
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid ID")]
    InvalidId,

    /// Store failure; carries the driver's message verbatim.
    #[error("{0}")]
    Database(String),

    /// Server-side failure answered with a fixed message; the cause is only logged.
    #[error("{0}")]
    Internal(&'static str),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::InvalidId => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error=%self, "request failed");
        } else {
            warn!(error=%self, "rejected request");
        }
        (status, self.to_string()).into_response()
    }
}
