//! HTTP error mapping
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use cadflow_core::CadflowError;
use serde_json::json;
use thiserror::Error;

use crate::TRACE_HEADER;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body could not be turned into a pipeline input
    #[error("BAD_REQUEST/{0}")]
    BadRequest(String),

    #[error("UNSUPPORTED_MEDIA_TYPE/{0}")]
    UnsupportedMediaType(String),

    #[error("{source}")]
    Analysis {
        trace_id: String,
        #[source]
        source: CadflowError,
    },

    #[error("INTERNAL/{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Analysis { source, .. } => match source {
                CadflowError::Validation(_) => StatusCode::BAD_REQUEST,
                CadflowError::Generation { .. } | CadflowError::Verification(_) => {
                    StatusCode::BAD_GATEWAY
                }
                CadflowError::UnresolvedVariable { .. } | CadflowError::Pipeline(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({ "error": self.to_string() });

        let mut trace_id = None;
        if let Self::Analysis { trace_id: id, source } = &self {
            if let Some(stage) = source.stage() {
                body["stage"] = json!(stage);
            }
            body["trace_id"] = json!(id);
            trace_id = Some(id.clone());
        }

        let mut response = (status, Json(body)).into_response();
        if let Some(value) = trace_id.and_then(|id| HeaderValue::from_str(&id).ok()) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(TRACE_HEADER), value);
        }
        response
    }
}
