use axum::http::StatusCode;
use thiserror::Error;

/// Failures of tracker operations that the user can act on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("Please enter both start and end times")]
    MissingTime,
    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("End time must be after start time")]
    InvalidInterval,
    #[error("day index {0} is outside Monday..Sunday")]
    InvalidDayIndex(u8),
    #[error("time blocks cannot be added to future dates")]
    FutureDay,
    #[error("time block {0} not found")]
    BlockNotFound(String),
    #[error("time block {0} is active; clock out before editing")]
    BlockActive(String),
    #[error("already clocked in")]
    AlreadyClockedIn,
    #[error("not clocked in")]
    NotClockedIn,
    #[error("no form is open")]
    FormClosed,
}

/// Persistence failures. These are logged by the repository and never
/// returned to callers of tracker operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        let status = match err {
            TrackerError::BlockNotFound(_) => StatusCode::NOT_FOUND,
            TrackerError::AlreadyClockedIn
            | TrackerError::NotClockedIn
            | TrackerError::BlockActive(_)
            | TrackerError::FormClosed => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
