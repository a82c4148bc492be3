//! OpenAI-compatible chat-completions wire format.
//!
//! Requests are built fresh from the transcript on every call; nothing here
//! is cached.

use serde::{Deserialize, Serialize};

use crate::completion::client::CompletionError;
use crate::completion::sanitize::sanitize_reply;
use crate::transcript::Message;

/// One `{role, content}` turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Request body: `{ model, messages }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
}

/// Response body.  Only the fields the client reads are modelled; missing
/// pieces deserialize to empty values.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// System instruction first, then every transcript message in order.
pub fn build_request<'a>(
    transcript: &'a [Message],
    system_prompt: &'a str,
    model: &'a str,
) -> ChatCompletionRequest<'a> {
    let mut messages = Vec::with_capacity(transcript.len() + 1);
    messages.push(ChatMessage {
        role: "system",
        content: system_prompt,
    });
    messages.extend(transcript.iter().map(|m| ChatMessage {
        role: m.sender.role(),
        content: &m.text,
    }));

    ChatCompletionRequest { model, messages }
}

/// Decode a 2xx response body into sanitized assistant text.
///
/// A response without a usable first choice yields the fallback reply;
/// only malformed JSON is an error.
pub fn parse_completion(body: &str) -> Result<String, CompletionError> {
    let response: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::Parse(e.to_string()))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content);

    if content.is_none() {
        log::warn!("completion: response carried no choice content");
    }

    Ok(sanitize_reply(content.as_deref()))
}
