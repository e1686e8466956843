//! Chat request bodies for the supported API flavours.

use serde::Serialize;

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self { role: "system", content: content.to_string() }
    }

    pub fn user(content: &str) -> Self {
        Self { role: "user", content: content.to_string() }
    }
}

/// OpenAI-compatible `chat/completions` body.
#[derive(Debug, Clone, Serialize)]
pub struct OpenAiRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Some compatible endpoints (Zhipu's bigmodel.cn) stream unless told not to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl OpenAiRequest {
    pub fn new(
        endpoint: &str, model: &str, prompt: &str, system_prompt: Option<&str>, max_tokens: u32, temperature: f32,
    ) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        Self {
            model: model.to_string(),
            messages,
            max_tokens,
            temperature,
            stream: endpoint.contains("bigmodel.cn").then_some(false),
        }
    }
}

/// Anthropic `messages` body. The system prompt is a top-level field.
#[derive(Debug, Clone, Serialize)]
pub struct AnthropicRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl AnthropicRequest {
    pub fn new(model: &str, prompt: &str, system_prompt: Option<&str>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            model: model.to_string(),
            system: system_prompt.map(str::to_string),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens,
            temperature,
        }
    }
}
