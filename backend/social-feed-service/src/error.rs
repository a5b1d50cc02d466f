/// Error types for social-feed-service
///
/// Every failure carries a machine-readable kind plus a human-readable
/// message; `ResponseError` maps the kind onto the HTTP status.
use crate::repository::AlreadyTaken;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidArgument(String),

    /// A unique field is held by someone else
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Unauthorized(String),
}

impl AppError {
    /// Machine-readable error kind
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Unavailable(_) => "UNAVAILABLE",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
            "status": status.as_u16(),
        }))
    }
}

/// Store failures surface as `Unavailable`; details stay in the logs.
/// A lost uniqueness race is the caller's conflict, not an outage.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(taken) = err.chain().find_map(|e| e.downcast_ref::<AlreadyTaken>()) {
            return AppError::Conflict(taken.to_string());
        }
        tracing::error!(error = ?err, "store operation failed");
        AppError::Unavailable("Storage temporarily unavailable".to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return AppError::Conflict("Resource already exists".to_string());
            }
        }
        tracing::error!(error = %err, "database operation failed");
        AppError::Unavailable("Storage temporarily unavailable".to_string())
    }
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::InvalidArgument("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Unavailable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_store_errors_are_opaque() {
        let err: AppError = anyhow::anyhow!("connection refused to 10.0.0.3").into();
        assert!(matches!(err, AppError::Unavailable(_)));
        assert!(!err.to_string().contains("10.0.0.3"));
    }

    #[test]
    fn test_already_taken_becomes_conflict() {
        let err: AppError = anyhow::Error::from(AlreadyTaken("Username")).into();
        assert!(matches!(err, AppError::Conflict(ref msg) if msg == "Username is already taken"));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let wrapped: AppError = anyhow::Error::from(AlreadyTaken("Email"))
            .context("Failed to update profile")
            .into();
        assert!(matches!(wrapped, AppError::Conflict(ref msg) if msg == "Email is already taken"));
    }

    #[actix_rt::test]
    async fn test_error_body_shape() {
        let resp = AppError::Forbidden("You are not authorized to delete this post".into())
            .error_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "FORBIDDEN");
        assert_eq!(json["status"], 403);
        assert_eq!(json["error"], "You are not authorized to delete this post");
    }
}
