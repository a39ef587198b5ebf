//! Capabilities: the two external services the pipeline depends on.
//!
//! Both are single-method traits so tests can substitute in-memory stubs and
//! production can plug in HTTP clients without the core knowing either.
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::data_model::VerificationVerdict;

/// Variable name → bound text for one stage invocation.
pub type Bindings = BTreeMap<String, String>;

/// Text generation: renders `template_id` with `bindings` and returns the
/// generated text.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, template_id: &str, bindings: &Bindings)
        -> Result<String, GenerationError>;
}

/// Cross-checks an aggregated analysis against the original input.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(
        &self,
        payload: &VerificationPayload,
    ) -> Result<VerificationVerdict, VerificationError>;
}

/// What the verifier gets to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationPayload {
    /// All stage outputs joined in declaration order
    pub combined_text: String,
    /// The original tolerance/dimensional data document
    pub original_data: String,
    /// Raw drawing bytes, only when the caller supplied a non-empty drawing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drawing: Option<Vec<u8>>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct GenerationError {
    message: String,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct VerificationError {
    message: String,
}

impl VerificationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
