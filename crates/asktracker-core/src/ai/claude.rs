use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::TransportError;
use crate::http;
use crate::state::{ChatMessage, ChatRole};
use crate::transport::CompletionBackend;

#[derive(Serialize)]
struct ClaudeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ClaudeMessage<'a>>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Clone)]
pub struct ClaudeClient {
    client: Client,
    url: Url,
    model: String,
    api_key: String,
}

impl ClaudeClient {
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
impl CompletionBackend for ClaudeClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, TransportError> {
        let endpoint = "POST v1/messages";
        let request = ClaudeRequest {
            model: &self.model,
            max_tokens,
            // The messages API wants the conversation to open with a user
            // turn, so the canned greeting is left out.
            messages: messages
                .iter()
                .skip_while(|m| m.role == ChatRole::Assistant)
                .map(|m| ClaudeMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
        };

        let request = self
            .client
            .post(self.url.clone())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request);

        let response = http::send(endpoint, request).await?;
        let claude_response: ClaudeResponse = http::read_json(endpoint, response).await?;

        let text: String = claude_response
            .content
            .into_iter()
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");
        if text.trim().is_empty() {
            return Err(TransportError::Malformed {
                endpoint: endpoint.into(),
                reason: "response carried no text blocks".into(),
            });
        }
        Ok(text)
    }
}
