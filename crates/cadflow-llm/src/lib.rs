//! LLM client abstraction layer
//!
//! A trait-based chat client so the prompt stages can talk to an
//! OpenAI-compatible endpoint in production and to a scripted mock in tests.

mod client;
mod error;
mod mock;
mod openai;
mod types;

pub use client::LLMClient;
pub use error::BackendError;
pub use mock::{MockLLMClient, MockResponse};
pub use openai::{OpenAICompatibleClient, OpenAIConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};
pub use types::{ChatMessage, LLMRequest, LLMResponse, MessageRole};
