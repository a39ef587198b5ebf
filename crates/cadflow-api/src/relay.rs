//! Verification relay: forwards the finished analysis to the VLM service.
use async_trait::async_trait;
use base64::Engine;
use cadflow_core::{VerificationError, VerificationPayload, VerificationVerdict, Verifier};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

/// Body posted to the VLM service
#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    result: &'a str,
    json: &'a str,
    /// Base64-encoded drawing
    #[serde(skip_serializing_if = "Option::is_none")]
    drawing: Option<String>,
}

impl<'a> From<&'a VerificationPayload> for RelayRequest<'a> {
    fn from(payload: &'a VerificationPayload) -> Self {
        Self {
            result: &payload.combined_text,
            json: &payload.original_data,
            drawing: payload
                .drawing
                .as_ref()
                .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes)),
        }
    }
}

pub struct HttpVerifier {
    url: String,
    http_client: Client,
}

impl HttpVerifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, VerificationError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VerificationError::new(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            url: url.into(),
            http_client,
        })
    }
}

#[async_trait]
impl Verifier for HttpVerifier {
    async fn verify(&self, payload: &VerificationPayload) -> Result<VerificationVerdict, VerificationError> {
        debug!(url = %self.url, chars = payload.combined_text.len(), "Sending confirmation request");

        let response = self
            .http_client
            .post(&self.url)
            .json(&RelayRequest::from(payload))
            .send()
            .await
            .map_err(|e| {
                error!("VLM request failed: {}", e);
                VerificationError::new(format!("VLM request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VerificationError::new(format!("VLM returned HTTP {}: {}", status, body)));
        }

        response
            .json::<VerificationVerdict>()
            .await
            .map_err(|e| VerificationError::new(format!("VLM response is not a verdict: {}", e)))
    }
}

/// Stand-in used when no VLM endpoint is configured: reports success and
/// echoes the payload back.
#[derive(Debug, Default)]
pub struct EchoVerifier;

#[async_trait]
impl Verifier for EchoVerifier {
    async fn verify(&self, payload: &VerificationPayload) -> Result<VerificationVerdict, VerificationError> {
        let echoed = serde_json::to_value(RelayRequest::from(payload))
            .map_err(|e| VerificationError::new(e.to_string()))?;
        Ok(VerificationVerdict::new("success").with_detail("payload", echoed))
    }
}
