use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;
use udf_rs::error::{ErrorKind, UdfError};

/// Errors surfaced by the UDF endpoints
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} is required")]
    MissingParam(&'static str),

    #[error(transparent)]
    Udf(#[from] UdfError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParam(_) => StatusCode::BAD_REQUEST,
            ApiError::Udf(e) => match e.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::Upstream => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // UDF clients read the message as a plain-text body.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, message).into_response()
    }
}
