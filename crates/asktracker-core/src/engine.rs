//! Feedback synchronization engine.
//!
//! Holds the local copy of the signed-in person's feedback list and keeps it
//! in step with the feedback service. Every change goes request, then await,
//! then reconcile: nothing is inserted, edited or removed locally until the
//! service has confirmed it, so the local list never runs ahead of the
//! service.
//!
//! Methods take `&self`. The list sits behind an async lock that is never
//! held across a service call, so a front end may issue several operations at
//! once; responses are applied in arrival order and a response aimed at an
//! item that has since disappeared is dropped.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::{Config, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::error::{ErrorKind, SyncError, TransportError};
use crate::feedback::{FeedbackDraft, FeedbackId, FeedbackItem, FeedbackPatch};
use crate::session::Session;
use crate::transport::FeedbackTransport;

/// What a successful update does when the item it returns was not in the
/// local list when the update was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownUpdatePolicy {
    /// Add the returned item to the end of the list.
    #[default]
    Append,
    /// Leave the list alone.
    Ignore,
    /// Reload the whole list from the service.
    Refresh,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub request_timeout: Duration,
    pub unknown_update_policy: UnknownUpdatePolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            unknown_update_policy: UnknownUpdatePolicy::default(),
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            unknown_update_policy: config.unknown_update_policy(),
        }
    }
}

#[derive(Default)]
struct EngineState {
    items: Vec<FeedbackItem>,
    last_error: Option<SyncError>,
}

/// Counts outstanding service calls for as long as it lives.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct FeedbackEngine<T> {
    transport: T,
    session: Session,
    settings: EngineSettings,
    state: RwLock<EngineState>,
    in_flight: AtomicUsize,
}

impl<T: FeedbackTransport> FeedbackEngine<T> {
    /// The engine cannot exist without a session; a signed-out front end
    /// never gets one and so never reaches the service.
    pub fn new(transport: T, session: Session, settings: EngineSettings) -> Self {
        Self {
            transport,
            session,
            settings,
            state: RwLock::new(EngineState::default()),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Snapshot of the local list, in display order.
    pub async fn items(&self) -> Vec<FeedbackItem> {
        self.state.read().await.items.clone()
    }

    pub async fn item(&self, id: FeedbackId) -> Option<FeedbackItem> {
        self.state
            .read()
            .await
            .items
            .iter()
            .find(|i| i.id == id)
            .cloned()
    }

    /// Whether the signed-in person may edit or delete `id`.
    pub async fn owns(&self, id: FeedbackId) -> bool {
        let owner = self.session.user_id();
        self.state
            .read()
            .await
            .items
            .iter()
            .any(|i| i.id == id && i.is_owned_by(owner))
    }

    /// True while any call to the service is outstanding.
    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn last_error_kind(&self) -> Option<ErrorKind> {
        self.state.read().await.last_error.as_ref().map(SyncError::kind)
    }

    /// Banner text for the most recent failure, if one is showing.
    pub async fn last_error_banner(&self) -> Option<String> {
        self.state.read().await.last_error.as_ref().map(SyncError::banner)
    }

    pub async fn dismiss_error(&self) {
        self.state.write().await.last_error = None;
    }

    /// Replace the local list with the service's.
    pub async fn refresh(&self) -> Result<usize, ErrorKind> {
        let outcome = self
            .call(
                "GET /feedback".to_string(),
                self.transport.list_all(&self.session.credential),
            )
            .await;

        match outcome {
            Ok(items) => {
                let count = items.len();
                let mut state = self.state.write().await;
                state.items = items;
                state.last_error = None;
                debug!(count, "feedback list refreshed");
                Ok(count)
            }
            Err(e) => Err(self.fail(ErrorKind::FetchFailed, e).await),
        }
    }

    /// Create a record owned by the session's identity and put the service's
    /// copy at the top of the list.
    pub async fn create(&self, draft: FeedbackDraft) -> Result<FeedbackItem, ErrorKind> {
        let outcome = self
            .call(
                "POST /feedback".to_string(),
                self.transport
                    .create(&self.session.credential, &draft, self.session.user_id()),
            )
            .await;

        match outcome {
            Ok(item) => {
                let mut state = self.state.write().await;
                // A refresh that landed first may already hold it.
                state.items.retain(|i| i.id != item.id);
                state.items.insert(0, item.clone());
                state.last_error = None;
                debug!(id = %item.id, "feedback created");
                Ok(item)
            }
            Err(e) => Err(self.fail(ErrorKind::CreateFailed, e).await),
        }
    }

    /// Send new title and body for `id` and swap in the service's copy.
    ///
    /// The request goes out even if `id` is not in the local list; what happens
    /// to the returned item then is governed by [`UnknownUpdatePolicy`]. Under
    /// `Refresh` a failed reload still returns `Ok` for the update but leaves
    /// `FetchFailed` in [`Self::last_error_kind`].
    pub async fn update(&self, id: FeedbackId, patch: FeedbackPatch) -> Result<FeedbackItem, ErrorKind> {
        let known_at_issue = self.state.read().await.items.iter().any(|i| i.id == id);

        let outcome = self
            .call(
                format!("PUT /feedback/{id}"),
                self.transport.update(&self.session.credential, id, &patch),
            )
            .await;

        let item = match outcome {
            Ok(item) => item,
            Err(e) => return Err(self.fail(ErrorKind::UpdateFailed, e).await),
        };

        let mut state = self.state.write().await;
        state.last_error = None;

        if let Some(slot) = state.items.iter_mut().find(|i| i.id == item.id) {
            *slot = item.clone();
            debug!(id = %item.id, "feedback updated");
            return Ok(item);
        }

        if known_at_issue {
            debug!(id = %item.id, "update arrived for an item no longer listed; dropped");
            return Ok(item);
        }

        match self.settings.unknown_update_policy {
            UnknownUpdatePolicy::Append => {
                debug!(id = %item.id, "update for unlisted item appended");
                state.items.push(item.clone());
            }
            UnknownUpdatePolicy::Ignore => {
                debug!(id = %item.id, "update for unlisted item ignored");
            }
            UnknownUpdatePolicy::Refresh => {
                drop(state);
                // The update itself went through; a failed reload only
                // shows up as a fetch error.
                if let Err(kind) = self.refresh().await {
                    warn!(id = %item.id, %kind, "reload after unlisted update failed");
                }
            }
        }

        Ok(item)
    }

    /// Delete `id` at the service, then drop it locally.
    pub async fn remove(&self, id: FeedbackId) -> Result<(), ErrorKind> {
        let outcome = self
            .call(
                format!("DELETE /feedback/{id}"),
                self.transport.delete(&self.session.credential, id),
            )
            .await;

        match outcome {
            Ok(()) => {
                let mut state = self.state.write().await;
                state.items.retain(|i| i.id != id);
                state.last_error = None;
                debug!(%id, "feedback deleted");
                Ok(())
            }
            Err(e) => Err(self.fail(ErrorKind::DeleteFailed, e).await),
        }
    }

    async fn call<R>(
        &self,
        endpoint: String,
        request: impl Future<Output = Result<R, TransportError>>,
    ) -> Result<R, TransportError> {
        let _in_flight = InFlight::enter(&self.in_flight);
        let after = self.settings.request_timeout;

        match tokio::time::timeout(after, request).await {
            Ok(outcome) => outcome,
            Err(_) => Err(TransportError::Timeout { endpoint, after }),
        }
    }

    async fn fail(&self, kind: ErrorKind, source: TransportError) -> ErrorKind {
        warn!(%kind, error = %source, "feedback service call failed");
        self.state.write().await.last_error = Some(SyncError::new(kind, source));
        kind
    }
}
