use std::fmt::Debug;
use std::fmt::Display;

use axum::response::Html;
use axum::{http::StatusCode, response::IntoResponse};
use diesel::result::DatabaseErrorKind;
use diesel_async::pooled_connection::deadpool::PoolError;

/// Failures reported by the store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    #[error("a tag named {0:?} already exists")]
    DuplicateName(String),

    #[error("no tag named {0:?}")]
    UnknownTag(String),

    #[error("{field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("storage unavailable: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::DuplicateName(_) => StatusCode::CONFLICT,
            Self::UnknownTag(_) | Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::IntegrityViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Backend(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

// Unique violations on tags.name are classified by the caller, which knows
// the offending name. Anything reaching this conversion is unclassified.
impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::DatabaseError(
                DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation,
                info,
            ) => Self::IntegrityViolation(info.message().to_owned()),
            other => Self::IntegrityViolation(other.to_string()),
        }
    }
}

impl From<PoolError> for StoreError {
    fn from(err: PoolError) -> Self {
        Self::Backend(err.to_string())
    }
}

pub struct AppError {
    pub inner: anyhow::Error,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        self.inner
            .downcast_ref::<StoreError>()
            .map(StoreError::status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self.inner, %status, "request failed");
        } else {
            tracing::info!(error = %self.inner, %status, "request rejected");
        }
        let heading = status.canonical_reason().unwrap_or("Error");
        (
            status,
            Html(format!(
                "<h1>{heading}</h1><p>{}</p><p><a href=\"javascript:history.back()\">Go back</a></p>",
                tera::escape_html(&self.inner.to_string())
            )),
        )
            .into_response()
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.inner, f)
    }
}

impl Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.inner, f)
    }
}

// This enables using `?` on functions that return `Result<_, anyhow::Error>` to turn them into
// `Result<_, AppError>`. That way you don't need to do that manually.
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self { inner: err.into() }
    }
}
