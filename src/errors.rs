use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::BookingStatus;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<String>),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("link invalid or expired")]
    TokenInvalid,

    #[error("this booking can no longer be modified, please contact the studio directly")]
    BookingTerminal,

    #[error("service temporarily unavailable, please retry")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(anyhow::Error),
}

// Lock contention and busy timeouts are transient; everything else is a
// server fault.
fn is_busy(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if matches!(
            err.code,
            rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
        )
    )
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        if is_busy(&e) {
            return AppError::Unavailable(e.to_string());
        }
        AppError::Database(e.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast_ref::<rusqlite::Error>() {
            Some(sql_err) if is_busy(sql_err) => AppError::Unavailable(e.to_string()),
            _ => AppError::Database(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::TokenInvalid => StatusCode::GONE,
            AppError::BookingTerminal => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AppError::Validation(details) => {
                serde_json::json!({ "error": self.to_string(), "details": details })
            }
            // Internal details stay in the logs, not the response.
            AppError::Database(e) => {
                tracing::error!(error = %e, "internal error");
                serde_json::json!({ "error": "internal error" })
            }
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        (status, axum::Json(body)).into_response()
    }
}
