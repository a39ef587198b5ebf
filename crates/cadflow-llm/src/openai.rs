//! OpenAI-compatible chat completions client
//!
//! Works against api.openai.com as well as any server exposing the same
//! `/v1/chat/completions` endpoint (vLLM, Ollama, LM Studio).

use crate::client::LLMClient;
use crate::error::BackendError;
use crate::types::{ChatMessage, LLMRequest, LLMResponse};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings for [`OpenAICompatibleClient`]
#[derive(Clone)]
pub struct OpenAIConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl OpenAIConfig {
    /// Read `OPENAI_API_KEY` (required), `OPENAI_BASE_URL`, `CADFLOW_MODEL`
    /// and `CADFLOW_LLM_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, BackendError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| BackendError::ConfigurationError {
                message: "OPENAI_API_KEY not set".to_string(),
            })?;

        let timeout_secs = match std::env::var("CADFLOW_LLM_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().map_err(|_| BackendError::ConfigurationError {
                message: format!("CADFLOW_LLM_TIMEOUT_SECS is not a number: {}", raw),
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            endpoint: std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            api_key,
            model: std::env::var("CADFLOW_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Thread-safe; share it behind an `Arc`.
pub struct OpenAICompatibleClient {
    endpoint: String,
    api_key: String,
    model: String,
    http_client: Client,
    timeout: Duration,
}

impl OpenAICompatibleClient {
    pub fn new(config: OpenAIConfig) -> Result<Self, BackendError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::ConfigurationError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            model: config.model,
            http_client,
            timeout: config.timeout,
        })
    }

    pub fn from_env() -> Result<Self, BackendError> {
        Self::new(OpenAIConfig::from_env()?)
    }

    fn map_send_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            error!("LLM request timed out after {:?}", self.timeout);
            BackendError::TimeoutError {
                seconds: self.timeout.as_secs(),
            }
        } else if e.is_connect() {
            error!("Cannot connect to LLM service at {}", self.endpoint);
            BackendError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else {
            error!("LLM request error: {}", e);
            BackendError::NetworkError {
                message: format!("Request failed: {}", e),
            }
        }
    }
}

#[async_trait]
impl LLMClient for OpenAICompatibleClient {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError> {
        let url = format!("{}/v1/chat/completions", self.endpoint);
        let body = CompletionRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(
            model = %self.model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );
        let start = Instant::now();

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("LLM API returned error status {}: {}", status, text);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    BackendError::AuthenticationError { message: text }
                }
                _ => BackendError::ApiError {
                    message: format!("HTTP {}: {}", status, text),
                    status_code: Some(status.as_u16()),
                },
            });
        }

        let parsed: CompletionResponse =
            response
                .json()
                .await
                .map_err(|e| BackendError::InvalidResponse {
                    message: format!("JSON parse error: {}", e),
                })?;

        let elapsed = start.elapsed();
        if let Some(usage) = &parsed.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Token usage"
            );
        }
        info!("LLM completion finished in {:.2}s", elapsed.as_secs_f64());

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .map(|message| message.content)
            .ok_or_else(|| BackendError::InvalidResponse {
                message: "No content in completion response".to_string(),
            })?;

        Ok(LLMResponse::text(content, elapsed))
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn model_info(&self) -> Option<String> {
        Some(format!("{} @ {}", self.model, self.endpoint))
    }
}

impl fmt::Debug for OpenAICompatibleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAICompatibleClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OpenAIConfig {
        OpenAIConfig {
            endpoint: "http://localhost:8000/".to_string(),
            api_key: "sk-test".to_string(),
            model: "qwen2.5".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let client = OpenAICompatibleClient::new(config()).unwrap();
        assert_eq!(client.model_info().unwrap(), "qwen2.5 @ http://localhost:8000");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("sk-test"));
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::user("hello")];
        let body = CompletionRequest {
            model: "m",
            messages: &messages,
            temperature: Some(0.2),
            max_tokens: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["messages"][0]["role"], "user");
        assert!(value.get("max_tokens").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let parsed: CompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"route"}}],"usage":{"prompt_tokens":3,"completion_tokens":1}}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.as_ref().unwrap().content, "route");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let client = OpenAICompatibleClient::new(OpenAIConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            ..config()
        })
        .unwrap();

        let result = client.chat(LLMRequest::new(vec![ChatMessage::user("hi")])).await;
        assert!(matches!(
            result,
            Err(BackendError::NetworkError { .. }) | Err(BackendError::TimeoutError { .. })
        ));
    }
}
