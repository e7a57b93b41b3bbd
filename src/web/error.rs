use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use thiserror::Error;
use tracing::error;

use crate::domain::access::AccessError;
use crate::domain::aggregates::{CustomerError, OrderError, ProductError};
use crate::domain::value_objects::{RatingError, TableCodeError};
use crate::{CafeteriaError, ErrorKind};

/// Everything a handler can fail with. Rendered as `{"error": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Domain(#[from] CafeteriaError),
    #[error("database error: {0}")]
    Database(sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Domain(CafeteriaError::Access(AccessError::BadCredentials)) => StatusCode::UNAUTHORIZED,
            Self::Domain(CafeteriaError::Access(AccessError::Forbidden(_))) => StatusCode::FORBIDDEN,
            Self::Domain(CafeteriaError::Order(
                OrderError::NotEditable(_) | OrderError::InvalidTransition { .. } | OrderError::InsufficientStock { .. },
            )) => StatusCode::CONFLICT,
            Self::Domain(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

// Primary result codes; extended codes keep them in the low byte.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Another transaction holds the write lock. Reported as a conflict so the
/// client retries, the same as a lost compare-and-set.
fn is_lock_contention(e: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db) = e else { return false };
    db.code()
        .and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        if is_lock_contention(&e) {
            return Self::Conflict("The order is being updated by another request, please try again".into());
        }
        Self::Database(e)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self { Self::Validation(e.to_string()) }
}

macro_rules! domain_error {
    ($($ty:ty),*) => {$(
        impl From<$ty> for ApiError {
            fn from(e: $ty) -> Self { Self::Domain(e.into()) }
        }
    )*};
}

domain_error!(OrderError, ProductError, CustomerError, AccessError, TableCodeError, RatingError);
