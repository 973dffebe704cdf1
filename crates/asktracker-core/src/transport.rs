//! Boundary traits between the core and the remote services.
//!
//! Implementations translate one intent into one outbound request and report
//! the outcome. They hold no state about feedback items or conversations.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::feedback::{FeedbackDraft, FeedbackId, FeedbackItem, FeedbackPatch, UserId};
use crate::session::Credential;
use crate::state::ChatMessage;

/// The feedback service: the authority over item ids and timestamps.
#[async_trait]
pub trait FeedbackTransport: Send + Sync {
    async fn list_all(&self, credential: &Credential) -> Result<Vec<FeedbackItem>, TransportError>;

    async fn create(
        &self,
        credential: &Credential,
        draft: &FeedbackDraft,
        owner: UserId,
    ) -> Result<FeedbackItem, TransportError>;

    async fn update(
        &self,
        credential: &Credential,
        id: FeedbackId,
        patch: &FeedbackPatch,
    ) -> Result<FeedbackItem, TransportError>;

    async fn delete(&self, credential: &Credential, id: FeedbackId) -> Result<(), TransportError>;
}

/// A chat-completion provider. Each backend carries its own credential.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Produce the next assistant turn for `messages`, at most `max_tokens` long.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, TransportError>;
}
