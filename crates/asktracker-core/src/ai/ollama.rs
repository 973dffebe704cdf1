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
struct OllamaMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: u32,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: OllamaResponseMessage,
    #[allow(dead_code)]
    #[serde(default)]
    done: bool,
}

/// Client for a local Ollama server's `/api/chat`. Needs no API key.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    url: Url,
    model: String,
}

impl OllamaClient {
    pub fn new(url: Url, model: &str, timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            url,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl CompletionBackend for OllamaClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, TransportError> {
        let endpoint = "POST api/chat";
        let request = OllamaRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| OllamaMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: false,
            options: OllamaOptions {
                num_predict: max_tokens,
            },
        };

        let response = http::send(endpoint, self.client.post(self.url.clone()).json(&request)).await?;
        let ollama_response: OllamaResponse = http::read_json(endpoint, response).await?;

        if ollama_response.message.content.trim().is_empty() {
            return Err(TransportError::Malformed {
                endpoint: endpoint.into(),
                reason: "empty message content. Make sure Ollama is running with: ollama serve"
                    .into(),
            });
        }
        Ok(ollama_response.message.content)
    }
}
