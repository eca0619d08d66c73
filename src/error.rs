//! Error types for Libris server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::models::copy::CopyStatus;

/// Numeric error codes reported in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchData = 4,
    CopyUnavailable = 5,
    NoActiveBorrow = 6,
    AlreadyReturned = 7,
    AlreadyPaid = 8,
    AlreadyLost = 9,
    PaymentRequired = 10,
    Duplicate = 11,
    BadValue = 12,
}

/// Outcomes of the borrow / return / fine lifecycle that the caller must act on
#[derive(Error, Debug)]
pub enum CirculationError {
    #[error("Book copy {copy_id} is not available (status: {status})")]
    CopyUnavailable { copy_id: i32, status: CopyStatus },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No active borrow found for copy {0}")]
    NoActiveBorrow(i32),

    #[error("Borrow {0} has already been returned")]
    AlreadyReturned(i32),

    #[error("Fine {0} has already been paid")]
    AlreadyPaid(i32),

    #[error("Book copy {0} is already marked as lost")]
    AlreadyLost(i32),

    #[error("Due date {due_date} is before borrow date {borrow_date}")]
    InvalidDueDate {
        borrow_date: NaiveDate,
        due_date: NaiveDate,
    },

    #[error("Fine {fine_id} does not belong to borrow {borrow_id}")]
    FineMismatch { fine_id: i32, borrow_id: i32 },

    #[error("Confirming a payment requires the fine_id of the outstanding fine {fine_id}")]
    FineIdRequired { fine_id: i32 },

    #[error("Fine {fine_id} on borrow {borrow_id} must be paid before the copy is returned")]
    PaymentRequired { fine_id: i32, borrow_id: i32 },

    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] sqlx::Error),
}

impl CirculationError {
    /// Only failed atomic writes may be retried blindly: nothing was committed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CirculationError::PersistenceFailure(_))
    }
}

pub type CirculationResult<T> = Result<T, CirculationError>;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Circulation(#[from] CirculationError),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

fn circulation_status(err: &CirculationError) -> (StatusCode, ErrorCode) {
    match err {
        CirculationError::CopyUnavailable { .. } => (StatusCode::CONFLICT, ErrorCode::CopyUnavailable),
        CirculationError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchData),
        CirculationError::NoActiveBorrow(_) => (StatusCode::NOT_FOUND, ErrorCode::NoActiveBorrow),
        CirculationError::AlreadyReturned(_) => (StatusCode::CONFLICT, ErrorCode::AlreadyReturned),
        CirculationError::AlreadyPaid(_) => (StatusCode::CONFLICT, ErrorCode::AlreadyPaid),
        CirculationError::AlreadyLost(_) => (StatusCode::CONFLICT, ErrorCode::AlreadyLost),
        CirculationError::InvalidDueDate { .. }
        | CirculationError::FineMismatch { .. }
        | CirculationError::FineIdRequired { .. } => (StatusCode::BAD_REQUEST, ErrorCode::BadValue),
        CirculationError::PaymentRequired { .. } => (StatusCode::PAYMENT_REQUIRED, ErrorCode::PaymentRequired),
        CirculationError::PersistenceFailure(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::DbFailure)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
            AppError::Circulation(err) => {
                let (status, code) = circulation_status(err);
                let message = if let CirculationError::PersistenceFailure(e) = err {
                    tracing::error!("Atomic write failed: {:?}", e);
                    "Storage temporarily unavailable, nothing was recorded; retry".to_string()
                } else {
                    err.to_string()
                };
                (status, code, message)
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
