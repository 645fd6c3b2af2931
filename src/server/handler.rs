// ABOUTME: Request handler for the /update endpoint.
// ABOUTME: Reads service and image parameters and hands them to the deployer.

use super::error::ApiError;
use crate::deployer::Deployer;
use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use std::sync::Arc;

/// Raw `service`/`image` parameters from the query string or form body.
///
/// A field given twice is rejected rather than resolved to its first value,
/// and an empty body value falls back to the query value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateParams {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl UpdateParams {
    /// Fill missing values from `fallback`.
    fn or(self, fallback: UpdateParams) -> UpdateParams {
        UpdateParams {
            service: non_empty(self.service).or(fallback.service),
            image: non_empty(self.image).or(fallback.image),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// A validated update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub target: String,
    pub image: String,
}

impl UpdateRequest {
    /// Both values must be present and non-empty.
    pub fn from_params(params: UpdateParams) -> Option<Self> {
        Some(Self {
            target: non_empty(params.service)?,
            image: non_empty(params.image)?,
        })
    }
}

/// Update a service's image.
///
/// Body parameters win over query parameters, so a form POST can carry its
/// values either way. Responds `202 Accepted` once the orchestrator took the
/// new spec.
pub async fn handle_update(
    State(deployer): State<Arc<dyn Deployer>>,
    query: Result<Query<UpdateParams>, QueryRejection>,
    form: Result<Form<UpdateParams>, FormRejection>,
) -> Result<StatusCode, ApiError> {
    let Query(query) = query.map_err(|e| invalid(e.body_text()))?;
    let form = match form {
        Ok(Form(form)) => form,
        Err(FormRejection::InvalidFormContentType(_)) => UpdateParams::default(),
        Err(e) => return Err(invalid(e.body_text())),
    };

    let request = UpdateRequest::from_params(form.or(query)).ok_or_else(|| {
        tracing::error!("Empty parameters");
        ApiError::EmptyParameters
    })?;

    run_update(deployer, request.clone()).await.inspect_err(|e| {
        tracing::error!(service = %request.target, image = %request.image, error = %e, "update failed");
    })?;

    tracing::info!(
        service = %request.target,
        image = %request.image,
        "Started update of {} to {}",
        request.target,
        request.image
    );
    Ok(StatusCode::ACCEPTED)
}

fn invalid(detail: String) -> ApiError {
    tracing::error!(error = %detail, "Invalid parameters");
    ApiError::InvalidParameters(detail)
}

// The update runs on its own task so a dropped connection cannot cut a
// conflict retry loop short.
async fn run_update(deployer: Arc<dyn Deployer>, request: UpdateRequest) -> Result<(), ApiError> {
    let task = tokio::spawn(async move { deployer.update(&request.target, &request.image).await });

    match task.await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => Err(ApiError::TaskFailed(e.to_string())),
    }
}
