//! HTTP-facing error taxonomy.
//!
//! Every handler failure ends up as an [`AppError`], rendered as
//! `{"detail": "<message>"}` with the matching status code. Internal errors
//! are logged in full and reported to the client without detail.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::any::Any;

use crate::domain::RateLimitError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ---
    /// Missing or malformed input.
    #[error("{0}")]
    BadRequest(String),

    /// The resource already exists.
    #[error("{0}")]
    Conflict(String),

    /// Bad credentials, an invalid or expired token, or a vanished user.
    #[error("{0}")]
    Unauthorized(String),

    /// Too many requests for this client and action.
    #[error("Rate limit exceeded. Retry after {retry_after_secs} seconds.")]
    RateLimited { retry_after_secs: u64 },

    /// Anything unexpected.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl AppError {
    // ---
    pub fn status_code(&self) -> StatusCode {
        // ---
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client.
    fn public_message(&self) -> String {
        // ---
        match self {
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<RateLimitError> for AppError {
    fn from(err: RateLimitError) -> Self {
        match err {
            RateLimitError::Exceeded { retry_after_secs } => Self::RateLimited { retry_after_secs },
            RateLimitError::Backend(err) => Self::Internal(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // ---
        if let Self::Internal(err) = &self {
            tracing::error!("Unhandled error: {:#}", err);
        }

        let status = self.status_code();
        let body = Json(ErrorBody {
            detail: self.public_message(),
        });
        let mut response = (status, body).into_response();

        match self {
            Self::RateLimited { retry_after_secs } => {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
            }
            Self::Unauthorized(_) => {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            _ => {}
        }

        response
    }
}

/// Top-level panic boundary used with `tower_http::catch_panic::CatchPanicLayer`.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    // ---
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };

    tracing::error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            detail: "Internal server error".to_string(),
        }),
    )
        .into_response()
}
