// ABOUTME: HTTP error responses for the update endpoint.
// ABOUTME: Maps request and deployer failures to status codes and plain-text bodies.

use crate::deployer::DeployError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Empty parameters")]
    EmptyParameters,

    #[error("Update failed: {0}")]
    UpdateFailed(#[from] DeployError),

    #[error("Update failed: {0}")]
    TaskFailed(String),
}

impl ApiError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidParameters(_) | Self::EmptyParameters => StatusCode::BAD_REQUEST,
            Self::UpdateFailed(_) | Self::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Parser details stay in the logs
        let message = match &self {
            Self::InvalidParameters(_) => "Invalid parameters".to_owned(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}
