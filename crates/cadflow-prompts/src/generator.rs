//! Generation capability backed by prompt templates and a chat client
use async_trait::async_trait;
use cadflow_core::{Bindings, GenerationError, Generator};
use cadflow_llm::{ChatMessage, LLMClient, LLMRequest};
use std::sync::Arc;
use tracing::debug;

use crate::renderer::PromptRenderer;

/// Renders the stage's template with its bindings and sends the result to
/// the LLM as a single user message.
pub struct PromptGenerator {
    renderer: PromptRenderer,
    client: Arc<dyn LLMClient>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl PromptGenerator {
    pub fn new(renderer: PromptRenderer, client: Arc<dyn LLMClient>) -> Self {
        Self {
            renderer,
            client,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn renderer(&self) -> &PromptRenderer {
        &self.renderer
    }

    fn build_request(&self, prompt: String) -> LLMRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.renderer.system_message() {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        let mut request = LLMRequest::new(messages);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }
}

#[async_trait]
impl Generator for PromptGenerator {
    async fn generate(&self, template_id: &str, bindings: &Bindings) -> Result<String, GenerationError> {
        let prompt = self
            .renderer
            .render(template_id, bindings)
            .map_err(|e| GenerationError::new(e.to_string()))?;

        debug!(
            template = template_id,
            client = self.client.name(),
            prompt_chars = prompt.len(),
            "Rendered prompt"
        );

        let response = self
            .client
            .chat(self.build_request(prompt))
            .await
            .map_err(|e| GenerationError::new(e.to_string()))?;

        if response.content.trim().is_empty() {
            return Err(GenerationError::new(format!(
                "{} returned an empty completion",
                self.client.name()
            )));
        }
        Ok(response.content)
    }
}
