use axum::http::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

/// Why a sales source could not supply the table.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no file at {}", .0.display())]
    Missing(PathBuf),
    #[error("{0} returned no rows")]
    Empty(&'static str),
}

impl SourceError {
    /// Absent sources fall through silently; everything else is shown to the viewer.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, SourceError::Missing(_))
    }
}
