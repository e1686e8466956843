//! AI chat-completion client.
//!
//! Sends a single prompt (plus an optional system prompt) to an
//! OpenAI-compatible or Anthropic chat endpoint and returns the reply text.
//!
//! ### Providers
//!
//! - **OpenAI / custom**: `Authorization: Bearer <key>`, reply text from
//!   `choices[0].message.content`.
//! - **Anthropic**: `x-api-key` and `anthropic-version` headers, reply text
//!   from the `text` content blocks.
//!
//! Non-2xx responses fail with `HTTP <status>: <reason>`; there is no retry.

pub mod error;
pub mod request;
pub mod response;

pub use error::AiError;
pub use request::{AnthropicRequest, ChatMessage, OpenAiRequest};

use async_trait::async_trait;
use pagelens_core::config::{AiConfig, AiProvider};
use reqwest::header;
use std::sync::Arc;
use std::time::Instant;

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "pagelens/0.1";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Something that can answer a prompt.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send `prompt` (with an optional system prompt) and return the reply text.
    async fn complete(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String, AiError>;
}

/// Check that the backend answers at all.
pub async fn test_connection(client: &dyn ChatClient) -> Result<String, AiError> {
    client.complete("Test", Some("Reply with \"OK\"")).await
}

/// [`ChatClient`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChatClient {
    http: reqwest::Client,
    provider: AiProvider,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl HttpChatClient {
    /// Create a client from AI settings, filling provider defaults.
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        if config.api_key.is_empty() {
            return Err(AiError::MissingApiKey);
        }
        let endpoint = config.endpoint_url().ok_or(AiError::MissingEndpoint)?;
        url::Url::parse(endpoint).map_err(|e| AiError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        let model = config.model_name().ok_or(AiError::MissingModel)?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| AiError::Network(Arc::new(e)))?;

        Ok(Self {
            http,
            provider: config.provider,
            endpoint: endpoint.to_string(),
            api_key: config.api_key.clone(),
            model: model.to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, prompt: &str, system_prompt: Option<&str>) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .post(&self.endpoint)
            .header(header::ACCEPT, "application/json");

        match self.provider {
            AiProvider::Anthropic => builder
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&AnthropicRequest::new(&self.model, prompt, system_prompt, self.max_tokens, self.temperature)),
            AiProvider::OpenAi | AiProvider::Custom => builder.bearer_auth(&self.api_key).json(&OpenAiRequest::new(
                &self.endpoint,
                &self.model,
                prompt,
                system_prompt,
                self.max_tokens,
                self.temperature,
            )),
        }
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn complete(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String, AiError> {
        let start = Instant::now();
        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "sending chat request");

        let http_response = self.build_request(prompt, system_prompt).send().await?;

        let status = http_response.status();
        tracing::debug!("AI response status: {}", status);

        if !status.is_success() {
            return Err(AiError::HttpError {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let bytes = http_response.bytes().await?;
        let text = match self.provider {
            AiProvider::Anthropic => response::anthropic_text(&bytes)?,
            AiProvider::OpenAi | AiProvider::Custom => response::openai_text(&bytes)?,
        };

        tracing::debug!("chat completed in {:?}, {} chars", start.elapsed(), text.len());
        Ok(text)
    }
}
