//! API Handlers
use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use cadflow_core::{ExecutionContext, PipelineInput, CADFLOW_VERSION};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::{intake, AppState, TRACE_HEADER};

/// Run the configured pipeline over one submission.
///
/// Accepts `application/json`, `multipart/form-data` and
/// `application/x-www-form-urlencoded` bodies.
pub async fn analyze(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    let input = read_input(&state, request).await?;

    let ctx = ExecutionContext::new(state.analyzer.pipeline().name());
    info!(
        trace_id = %ctx.trace_id,
        fields = ?input.names().collect::<Vec<_>>(),
        "Analysis requested"
    );

    let result = state.analyzer.analyze_with(&input, &ctx).await;
    state.metrics.record(&result);

    match result {
        Ok(record) => {
            let trace_id = HeaderValue::from_str(&ctx.trace_id)
                .map_err(|e| ApiError::Internal(format!("invalid trace id: {}", e)))?;
            Ok((
                [(HeaderName::from_static(TRACE_HEADER), trace_id)],
                Json(record),
            )
                .into_response())
        }
        Err(source) => {
            warn!(trace_id = %ctx.trace_id, error = %source, "Analysis failed");
            Err(ApiError::Analysis {
                trace_id: ctx.trace_id,
                source,
            })
        }
    }
}

async fn read_input(state: &AppState, request: Request) -> Result<PipelineInput, ApiError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("application/json") {
        let Json(body) = Json::<Value>::from_request(request, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        intake::from_json(body)
    } else if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        intake::from_multipart(multipart).await
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(fields) = Form::<HashMap<String, String>>::from_request(request, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Ok(intake::from_form(fields))
    } else if content_type.is_empty() {
        Err(ApiError::UnsupportedMediaType("missing content-type".to_string()))
    } else {
        Err(ApiError::UnsupportedMediaType(content_type))
    }
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": CADFLOW_VERSION })),
    )
}

/// The pipeline this instance runs: name, inputs and stage chain
pub async fn pipeline(State(state): State<AppState>) -> Json<Value> {
    let pipeline = state.analyzer.pipeline();
    Json(json!({
        "name": pipeline.name(),
        "pipeline_id": pipeline.pipeline_id(),
        "required_inputs": pipeline.required_inputs(),
        "optional_inputs": pipeline.optional_inputs(),
        "stages": pipeline.stages(),
    }))
}

pub async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state
        .metrics
        .encode()
        .map_err(|e| ApiError::Internal(format!("metrics encoding failed: {}", e)))?;
    Ok((
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
