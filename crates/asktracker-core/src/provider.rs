#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    HuggingFace,
    OpenAI,
    Ollama,
    Claude,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::HuggingFace => "huggingface",
            Provider::OpenAI => "openai",
            Provider::Ollama => "ollama",
            Provider::Claude => "claude",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "huggingface" | "hf" => Some(Provider::HuggingFace),
            "openai" => Some(Provider::OpenAI),
            "ollama" => Some(Provider::Ollama),
            "claude" | "anthropic" => Some(Provider::Claude),
            _ => None,
        }
    }

    pub fn all() -> Vec<Provider> {
        vec![
            Provider::HuggingFace,
            Provider::OpenAI,
            Provider::Ollama,
            Provider::Claude,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::HuggingFace => "Hugging Face Router",
            Provider::OpenAI => "ChatGPT (OpenAI)",
            Provider::Ollama => "Ollama (Local)",
            Provider::Claude => "Claude (Anthropic)",
        }
    }

    /// Endpoint used when the config does not name one.
    pub fn default_url(&self) -> &'static str {
        match self {
            Provider::HuggingFace => "https://router.huggingface.co/v1/chat/completions",
            Provider::OpenAI => "https://api.openai.com/v1/chat/completions",
            Provider::Ollama => "http://localhost:11434/api/chat",
            Provider::Claude => "https://api.anthropic.com/v1/messages",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::HuggingFace => "moonshotai/Kimi-K2-Instruct",
            Provider::OpenAI => "gpt-4o-mini",
            Provider::Ollama => "llama3.2:latest",
            Provider::Claude => "claude-3-5-haiku-20241022",
        }
    }

    /// Local Ollama is the only provider that works without an API token.
    pub fn requires_token(&self) -> bool {
        !matches!(self, Provider::Ollama)
    }
}
