//! Chat session controller.
//!
//! Keeps the conversation with the assistant and drives at most one
//! completion request at a time. A submission made while a reply is still
//! outstanding is dropped, not queued. Every accepted submission ends with
//! exactly one assistant turn: the backend's answer, a fixed apology when
//! the backend fails, or configuration guidance when there is no backend.
//! Failures never leave the controller as errors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::{Config, DEFAULT_COMPLETION_TIMEOUT_SECS, DEFAULT_MAX_TOKENS};
use crate::error::TransportError;
use crate::state::ChatMessage;
use crate::transport::CompletionBackend;

pub const GREETING: &str =
    "Hello! I'm your AI assistant. How can I help you with your feedback today?";

pub const DEGRADED_REPLY: &str =
    "Sorry, I'm having trouble responding right now. Please try again later.";

/// Pause before the guidance reply when no backend is configured.
pub const OFFLINE_REPLY_DELAY: Duration = Duration::from_secs(1);

/// Reply used when no completion backend is configured.
pub fn guidance_reply(text: &str) -> String {
    format!(
        "I understand you're asking about: \"{text}\". To get real AI responses, please add a \
         completion API token (ASKTRACKER_COMPLETION_TOKEN) to your environment or config file."
    )
}

#[derive(Debug, Clone, Copy)]
pub struct ChatSettings {
    pub max_tokens: u32,
    pub completion_timeout: Duration,
    pub offline_delay: Duration,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            completion_timeout: Duration::from_secs(DEFAULT_COMPLETION_TIMEOUT_SECS),
            offline_delay: OFFLINE_REPLY_DELAY,
        }
    }
}

impl ChatSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_tokens: config.max_tokens(),
            completion_timeout: config.completion_timeout(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Blank,
    Busy,
}

/// What became of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was appended.
    Rejected(RejectReason),
    /// The backend answered.
    Replied(ChatMessage),
    /// The backend failed; the apology was appended instead.
    Degraded(ChatMessage),
    /// No backend is configured; guidance was appended.
    Guidance(ChatMessage),
    /// The session was reset while the reply was outstanding; the reply
    /// went nowhere.
    Discarded,
}

impl SubmitOutcome {
    /// The assistant turn that was appended, if any.
    pub fn reply(&self) -> Option<&ChatMessage> {
        match self {
            SubmitOutcome::Replied(m) | SubmitOutcome::Degraded(m) | SubmitOutcome::Guidance(m) => {
                Some(m)
            }
            SubmitOutcome::Rejected(_) | SubmitOutcome::Discarded => None,
        }
    }
}

/// One conversation: the greeting plus everything appended since.
pub struct ChatSession {
    history: RwLock<Vec<ChatMessage>>,
    awaiting: AtomicBool,
}

impl ChatSession {
    fn new() -> Self {
        Self {
            history: RwLock::new(vec![ChatMessage::assistant(GREETING)]),
            awaiting: AtomicBool::new(false),
        }
    }
}

/// Holds the awaiting flag for one submission and clears it when dropped,
/// whether the submission finished, panicked or was cancelled.
struct AwaitingGuard<'a>(&'a AtomicBool);

impl<'a> AwaitingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for AwaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ChatController {
    backend: Option<Arc<dyn CompletionBackend>>,
    settings: ChatSettings,
    current: RwLock<Arc<ChatSession>>,
}

impl ChatController {
    /// `backend: None` runs the controller in degraded mode.
    pub fn new(backend: Option<Arc<dyn CompletionBackend>>, settings: ChatSettings) -> Self {
        Self {
            backend,
            settings,
            current: RwLock::new(Arc::new(ChatSession::new())),
        }
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn history(&self) -> Vec<ChatMessage> {
        let session = self.current.read().await.clone();
        let history = session.history.read().await;
        history.clone()
    }

    pub async fn is_awaiting(&self) -> bool {
        self.current.read().await.awaiting.load(Ordering::Acquire)
    }

    /// Throw the conversation away and start over from the greeting. A reply
    /// still outstanding for the old conversation is discarded when it lands.
    pub async fn reset(&self) {
        *self.current.write().await = Arc::new(ChatSession::new());
        debug!("chat session reset");
    }

    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            return SubmitOutcome::Rejected(RejectReason::Blank);
        }

        let session = self.current.read().await.clone();
        let Some(_awaiting) = AwaitingGuard::acquire(&session.awaiting) else {
            debug!("submission dropped while a reply is outstanding");
            return SubmitOutcome::Rejected(RejectReason::Busy);
        };

        let transcript = {
            let mut history = session.history.write().await;
            history.push(ChatMessage::operator(text));
            history.clone()
        };

        let outcome = match &self.backend {
            Some(backend) => self.ask(backend, transcript).await,
            None => {
                tokio::time::sleep(self.settings.offline_delay).await;
                SubmitOutcome::Guidance(ChatMessage::assistant(guidance_reply(text)))
            }
        };

        if !Arc::ptr_eq(&session, &*self.current.read().await) {
            debug!("reply for a reset session discarded");
            return SubmitOutcome::Discarded;
        }

        if let Some(reply) = outcome.reply() {
            session.history.write().await.push(reply.clone());
        }
        outcome
    }

    /// Runs the completion on its own task so a panicking backend ends up as
    /// a degraded reply rather than unwinding through the caller.
    async fn ask(&self, backend: &Arc<dyn CompletionBackend>, transcript: Vec<ChatMessage>) -> SubmitOutcome {
        let max_tokens = self.settings.max_tokens;
        let worker = backend.clone();
        let mut task = CompletionTask(tokio::spawn(async move {
            worker.complete(&transcript, max_tokens).await
        }));

        let degraded = SubmitOutcome::Degraded(ChatMessage::assistant(DEGRADED_REPLY));
        match tokio::time::timeout(self.settings.completion_timeout, &mut task.0).await {
            Ok(Ok(Ok(content))) if !content.trim().is_empty() => {
                SubmitOutcome::Replied(ChatMessage::assistant(content))
            }
            Ok(Ok(Ok(_))) => {
                warn!(backend = backend.name(), "completion came back empty");
                degraded
            }
            Ok(Ok(Err(e))) => {
                warn!(backend = backend.name(), error = %e, "completion failed");
                degraded
            }
            Ok(Err(e)) => {
                warn!(backend = backend.name(), error = %e, "completion task died");
                degraded
            }
            Err(_) => {
                warn!(
                    backend = backend.name(),
                    timeout = ?self.settings.completion_timeout,
                    "completion timed out"
                );
                degraded
            }
        }
    }
}

/// Aborts the completion task when the submission that owns it goes away.
struct CompletionTask(JoinHandle<Result<String, TransportError>>);

impl Drop for CompletionTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}
