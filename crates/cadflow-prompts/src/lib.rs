//! CADFLOW Prompts: templates rendered into LLM requests
//!
//! Each pipeline stage names a template; [`PromptGenerator`] renders it with
//! the stage's bindings and sends the prompt to an [`LLMClient`].
//!
//! # Example
//!
//! ```ignore
//! use cadflow_prompts::{default_renderer, PromptGenerator};
//! use cadflow_llm::OpenAICompatibleClient;
//! use std::sync::Arc;
//!
//! let client = Arc::new(OpenAICompatibleClient::from_env()?);
//! let generator = PromptGenerator::new(default_renderer()?, client).with_temperature(0.2);
//! ```
//!
//! [`LLMClient`]: cadflow_llm::LLMClient

pub mod generator;
pub mod renderer;
pub mod templates;

pub use generator::PromptGenerator;
pub use renderer::PromptRenderer;
pub use templates::{PromptFile, PromptTemplate};

use thiserror::Error;

/// Prompts shipped with the crate
pub const DEFAULT_PROMPTS: &str = include_str!("../prompts/cad-analysis.yaml");

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt file load failed: {0}")]
    Load(String),
    #[error("Template '{name}' is invalid: {message}")]
    Template { name: String, message: String },
    #[error("Unknown template '{0}'")]
    UnknownTemplate(String),
    #[error("Render of '{name}' failed: {message}")]
    Render { name: String, message: String },
}

/// Renderer over the shipped prompt file
pub fn default_renderer() -> Result<PromptRenderer, PromptError> {
    PromptRenderer::new(PromptFile::from_yaml(DEFAULT_PROMPTS)?)
}
