use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::TransportError;
use crate::http;
use crate::state::ChatMessage;
use crate::transport::CompletionBackend;

#[derive(Serialize)]
struct OpenAIMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

/// Client for any OpenAI-compatible `chat/completions` endpoint: OpenAI
/// itself or the Hugging Face router.
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    url: Url,
    model: String,
    api_key: String,
}

impl OpenAIClient {
    pub fn new(url: Url, model: &str, api_key: &str, timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            url,
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAIClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, TransportError> {
        let endpoint = "POST chat/completions";
        let request = OpenAIRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens,
        };

        let request = self
            .client
            .post(self.url.clone())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request);

        let response = http::send(endpoint, request).await?;
        let openai_response: OpenAIResponse = http::read_json(endpoint, response).await?;

        openai_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| TransportError::Malformed {
                endpoint: endpoint.into(),
                reason: "no message content in choices".into(),
            })
    }
}
