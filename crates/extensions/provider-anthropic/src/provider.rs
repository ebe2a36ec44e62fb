//! Anthropic provider implementation.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use pagepilot_protocols::{GenerationContext, GenerationProvider, ProviderError};

use crate::api::{ApiMessage, ApiMetadata, ApiRequest, ApiResponse};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Generation over the Anthropic messages endpoint.
pub struct AnthropicProvider {
    id: String,
    api_key: String,
    api_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            id: "anthropic".to_string(),
            api_key,
            api_url: API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
            client: http_client(DEFAULT_TIMEOUT),
        }
    }

    pub fn with_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Whole-request deadline, including reading the body.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.client = http_client(timeout);
        self
    }

    fn build_request<'a>(&'a self, prompt: &'a str, context: &'a GenerationContext) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.model,
            messages: vec![ApiMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            metadata: context
                .user_id
                .as_deref()
                .map(|user_id| ApiMetadata { user_id }),
        }
    }

    async fn send_request(&self, api_request: &ApiRequest<'_>) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(api_request)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            let body = response.text().await.unwrap_or_default();
            // {"type": "error", "error": {"type": "...", "message": "..."}}
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(String::from))
                .unwrap_or(body);
            return Err(match status {
                // overloaded
                529 => ProviderError::ApiError {
                    status: 503,
                    message,
                },
                _ => ProviderError::from_api_response(status, message)
                    .with_retry_after(retry_after.as_deref()),
            });
        }

        Ok(response)
    }
}

fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(timeout)
        .build()
        .expect("Failed to build HTTP client")
}

fn transport_error(error: reqwest::Error, timeout: Duration) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(timeout.as_secs())
    } else {
        ProviderError::Network(error.to_string())
    }
}

#[async_trait]
impl GenerationProvider for AnthropicProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        context: &GenerationContext,
    ) -> Result<String, ProviderError> {
        debug!("{} request: model={}, {} prompt chars", self.id, self.model, prompt.len());

        let api_request = self.build_request(prompt, context);
        let response = self.send_request(&api_request).await?;
        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    transport_error(e, self.timeout)
                } else {
                    ProviderError::InvalidResponse(e.to_string())
                }
            })?;

        api_response
            .into_text()
            .ok_or_else(|| ProviderError::InvalidResponse("No text content in response".to_string()))
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
