use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use std::fmt;

use crate::google::GoogleError;

#[derive(Debug)]
pub enum AppError {
    Validation(Vec<String>),
    NotFound(&'static str),
    Upstream { status: u16, message: String },
    Db(sqlx::Error),
    Migrate(sqlx::migrate::MigrateError),
    Json(serde_json::Error),
    Io(std::io::Error),
}

impl AppError {
    /// Single-message validation failure.
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => write!(f, "Validation error: {}", errors.join("; ")),
            AppError::NotFound(what) => write!(f, "{what} not found"),
            AppError::Upstream { status, message } => write!(f, "Upstream error ({status}): {message}"),
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Migrate(e) => write!(f, "Migration error: {e}"),
            AppError::Json(e) => write!(f, "JSON error: {e}"),
            AppError::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for AppError {}

/// Upstream statuses are relayed as-is when they are error codes; anything
/// else (2xx from a malformed body, transport failures) becomes 502.
fn upstream_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status)
        .ok()
        .filter(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream { status, .. } => upstream_status(*status),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            AppError::Validation(errors) => HttpResponse::build(status).json(json!({
                "error": errors.first().cloned().unwrap_or_else(|| "Invalid request".to_string()),
                "details": errors,
            })),
            AppError::NotFound(what) => {
                HttpResponse::build(status).json(json!({ "error": format!("{what} not found") }))
            }
            AppError::Upstream { message, .. } => {
                HttpResponse::build(status).json(json!({ "error": message }))
            }
            _ => {
                log::error!("{self}");
                HttpResponse::build(status).json(json!({ "error": "Internal server error" }))
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Db(e)
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        AppError::Migrate(e)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Json(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e)
    }
}

impl From<GoogleError> for AppError {
    fn from(e: GoogleError) -> Self {
        match e {
            GoogleError::Status { status, message } => AppError::Upstream { status, message },
            other => AppError::Upstream {
                status: StatusCode::BAD_GATEWAY.as_u16(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(AppError::invalid("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("Template").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Io(std::io::Error::other("disk")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_status_is_relayed() {
        let err = AppError::Upstream { status: 403, message: "API key not valid".into() };
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let err = AppError::Upstream { status: 200, message: "garbled".into() };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn google_transport_failure_becomes_bad_gateway() {
        let err: AppError = GoogleError::Transport("connection refused".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn not_found_message() {
        assert_eq!(AppError::NotFound("Template").to_string(), "Template not found");
    }
}
