use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use std::fmt;

use crate::reservation::{ErrorKind, ReservationError};
use crate::schedule::ScheduleError;
use crate::store::StoreError;

#[derive(Debug)]
pub enum AppError {
    Reservation(ReservationError),
    Schedule(ScheduleError),
    Store(StoreError),
    Validation(String),
    PermissionDenied(String),
    Unauthenticated,
    NotFound,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Reservation(e) => write!(f, "Reservation error: {e}"),
            AppError::Schedule(e) => write!(f, "Schedule error: {e}"),
            AppError::Store(e) => write!(f, "Store error: {e}"),
            AppError::Validation(e) => write!(f, "Validation failed: {e}"),
            AppError::PermissionDenied(e) => write!(f, "Permission denied: {e}"),
            AppError::Unauthenticated => write!(f, "Missing caller identity"),
            AppError::NotFound => write!(f, "Not found"),
        }
    }
}

fn kind_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::InvalidState => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Reservation(e) => kind_status(e.kind()),
            AppError::Schedule(ScheduleError::InvalidPlan(_)) | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Schedule(ScheduleError::Store(_)) | AppError::Store(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{self}");
        }
        let body = match self {
            AppError::Reservation(e) => ApiErrorResponse {
                error: e.user_message().to_string(),
                details: Some(e.to_string()),
            },
            AppError::Validation(e) | AppError::Schedule(ScheduleError::InvalidPlan(e)) => {
                ApiErrorResponse {
                    error: "Validation failed".to_string(),
                    details: Some(e.clone()),
                }
            }
            AppError::Schedule(ScheduleError::Store(_)) | AppError::Store(_) => ApiErrorResponse {
                error: "The service is temporarily unavailable. Please try again.".to_string(),
                details: None,
            },
            _ => ApiErrorResponse {
                error: self.to_string(),
                details: None,
            },
        };
        HttpResponse::build(status).json(body)
    }
}

impl From<ReservationError> for AppError {
    fn from(e: ReservationError) -> Self {
        AppError::Reservation(e)
    }
}

impl From<ScheduleError> for AppError {
    fn from(e: ScheduleError) -> Self {
        AppError::Schedule(e)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}
