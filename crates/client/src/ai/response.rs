//! Reply parsing for the supported API flavours.

use serde::Deserialize;

use super::AiError;

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiMessage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// `choices[0].message.content` of an OpenAI-compatible reply.
pub fn openai_text(body: &[u8]) -> Result<String, AiError> {
    let response: OpenAiResponse = serde_json::from_slice(body).map_err(|e| AiError::InvalidResponse(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| AiError::InvalidResponse("missing choices[0].message.content".to_string()))
}

/// The concatenated text blocks of an Anthropic reply.
pub fn anthropic_text(body: &[u8]) -> Result<String, AiError> {
    let response: AnthropicResponse =
        serde_json::from_slice(body).map_err(|e| AiError::InvalidResponse(e.to_string()))?;
    let texts: Vec<String> = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();
    if texts.is_empty() {
        return Err(AiError::InvalidResponse("no text content blocks".to_string()));
    }
    Ok(texts.concat())
}

/// Some proxies hand back the whole completion object as the message text.
/// Unwrap it when that happens; otherwise return `text` unchanged.
pub fn unwrap_completion(text: &str) -> String {
    openai_text(text.as_bytes()).unwrap_or_else(|_| text.to_string())
}
