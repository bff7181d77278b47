use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::multipart::MultipartRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Error returned by every handler; rendered as `{"message": ...}`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    /// Unique-constraint collisions. The API reports them as 400.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(e) => {
                error!(error = ?e, "request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

// Extractor rejections are client errors; keep their text, drop axum's status.
macro_rules! rejection_as_validation {
    ($($rejection:ty),+) => {
        $(
            impl From<$rejection> for AppError {
                fn from(rejection: $rejection) -> Self {
                    warn!(status = %rejection.status(), "request rejected: {}", rejection.body_text());
                    AppError::Validation(rejection.body_text())
                }
            }
        )+
    };
}

rejection_as_validation!(JsonRejection, PathRejection, QueryRejection, MultipartRejection);

/// True when the error wraps a Postgres unique-index violation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<sqlx::Error>(),
            Some(sqlx::Error::Database(db)) if db.is_unique_violation()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn variants_map_to_statuses_with_message_body() {
        let cases = [
            (AppError::validation("title is required"), StatusCode::BAD_REQUEST),
            (AppError::conflict("already exists"), StatusCode::BAD_REQUEST),
            (AppError::Auth("Invalid credentials".into()), StatusCode::UNAUTHORIZED),
            (AppError::forbidden("not yours"), StatusCode::FORBIDDEN),
            (AppError::not_found("Recipe not found"), StatusCode::NOT_FOUND),
        ];
        for (err, expected) in cases {
            let msg = err.to_string();
            let (status, body) = body_of(err).await;
            assert_eq!(status, expected);
            assert_eq!(body["message"], msg);
        }
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, body) = body_of(anyhow::anyhow!("connection refused").into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }

    #[test]
    fn plain_errors_are_not_unique_violations() {
        let err = anyhow::Error::new(sqlx::Error::RowNotFound);
        assert!(!is_unique_violation(&err));
        assert!(!is_unique_violation(&anyhow::anyhow!("boom")));
    }
}
