//! Request intake: normalizes JSON, multipart and urlencoded submissions
//! into a `PipelineInput`.
//!
//! `json` is accepted as an alias of `data` and `pdf` as an alias of
//! `drawing`. Emptiness is not checked here; the sequencer validates.
use axum::extract::Multipart;
use cadflow_core::{PipelineInput, DATA_FIELD, DRAWING_FIELD};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::ApiError;

fn canonical_name(name: &str) -> &str {
    match name {
        "json" => DATA_FIELD,
        "pdf" => DRAWING_FIELD,
        other => other,
    }
}

/// Structured values (objects, arrays, numbers) are kept as their JSON
/// text, so a tolerance document may be posted either pre-serialized or
/// inline.
fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub fn from_json(body: Value) -> Result<PipelineInput, ApiError> {
    let Value::Object(fields) = body else {
        return Err(ApiError::BadRequest("request body must be a JSON object".to_string()));
    };

    let mut input = PipelineInput::new();
    for (name, value) in &fields {
        let canonical = canonical_name(name);
        // The canonical field wins over its alias when both are sent
        if canonical != name.as_str() && fields.contains_key(canonical) {
            continue;
        }
        if let Some(text) = value_to_text(value) {
            input.insert(canonical, text);
        }
    }
    Ok(input)
}

pub fn from_form(fields: HashMap<String, String>) -> PipelineInput {
    let mut input = PipelineInput::new();
    for (name, value) in &fields {
        let canonical = canonical_name(name);
        if canonical != name.as_str() && fields.contains_key(canonical) {
            continue;
        }
        input.insert(canonical, value.clone());
    }
    input
}

/// The data field is always read as UTF-8 text. Other file parts are kept
/// as bytes, plain fields as text.
pub async fn from_multipart(mut multipart: Multipart) -> Result<PipelineInput, ApiError> {
    let mut input = PipelineInput::new();
    let mut explicit = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let canonical = canonical_name(&name).to_string();
        let is_alias = canonical != name;
        let is_file = field.file_name().is_some();

        if is_alias && explicit.contains(&canonical) {
            continue;
        }
        if !is_alias {
            explicit.push(canonical.clone());
        }

        if canonical == DATA_FIELD {
            // Tolerance documents are often uploaded as files; they are still text
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read '{}': {}", name, e)))?;
            let text = String::from_utf8(bytes.to_vec())
                .map_err(|_| ApiError::BadRequest(format!("'{}' must be UTF-8 text", name)))?;
            input.insert(canonical, text);
        } else if is_file || canonical == DRAWING_FIELD {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read '{}': {}", name, e)))?;
            input.insert(canonical, bytes.to_vec());
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read '{}': {}", name, e)))?;
            input.insert(canonical, text);
        }
    }

    Ok(input)
}
