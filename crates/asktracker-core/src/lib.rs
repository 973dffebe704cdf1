pub mod ai;
pub mod api;
pub mod chat;
pub mod config;
pub mod engine;
pub mod error;
pub mod feedback;
mod http;
pub mod provider;
pub mod session;
pub mod state;
pub mod transport;

// Re-export main types for convenience
pub use ai::{backend_from_config, ClaudeClient, OllamaClient, OpenAIClient};
pub use api::FeedbackApiClient;
pub use chat::{ChatController, ChatSettings, RejectReason, SubmitOutcome};
pub use config::Config;
pub use engine::{EngineSettings, FeedbackEngine, UnknownUpdatePolicy};
pub use error::{ErrorKind, SyncError, TransportError};
pub use feedback::{FeedbackDraft, FeedbackId, FeedbackItem, FeedbackPatch, UserId};
pub use provider::Provider;
pub use session::{Credential, Identity, Session, SessionGuard, SessionRecord};
pub use state::{ChatMessage, ChatRole};
pub use transport::{CompletionBackend, FeedbackTransport};
