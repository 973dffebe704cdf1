pub mod claude;
pub mod ollama;
pub mod openai;

pub use claude::ClaudeClient;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;

use std::sync::Arc;

use tracing::info;

use crate::config::{Config, ConfigError};
use crate::provider::Provider;
use crate::transport::CompletionBackend;

/// Build the completion backend the config asks for.
///
/// `Ok(None)` means no backend is configured (a provider that needs a token
/// but has none); the chat controller then runs in degraded mode.
pub fn backend_from_config(config: &Config) -> Result<Option<Arc<dyn CompletionBackend>>, ConfigError> {
    let provider = config.provider()?;
    let token = config.completion_token();

    if provider.requires_token() && token.is_none() {
        info!(provider = provider.as_str(), "no completion token configured");
        return Ok(None);
    }

    let url = config.completion_url()?;
    let model = config.completion_model()?;
    let timeout = config.completion_timeout();
    let token = token.unwrap_or_default();

    let backend: Arc<dyn CompletionBackend> = match provider {
        Provider::HuggingFace | Provider::OpenAI => {
            Arc::new(OpenAIClient::new(url, &model, token, timeout)?)
        }
        Provider::Claude => Arc::new(ClaudeClient::new(url, &model, token, timeout)?),
        Provider::Ollama => Arc::new(OllamaClient::new(url, &model, timeout)?),
    };

    info!(provider = provider.as_str(), model = %model, "completion backend ready");
    Ok(Some(backend))
}
