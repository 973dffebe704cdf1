//! HTTP client for the feedback service.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/feedback` | List all feedback |
//! | POST   | `/feedback` | Create feedback |
//! | PUT    | `/feedback/{id}` | Update feedback |
//! | DELETE | `/feedback/{id}` | Delete feedback |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::error::TransportError;
use crate::feedback::{FeedbackDraft, FeedbackId, FeedbackItem, FeedbackPatch, UserId};
use crate::http;
use crate::session::Credential;
use crate::transport::FeedbackTransport;

#[derive(Serialize)]
struct CreateFeedbackRequest<'a> {
    title: &'a str,
    message: &'a str,
    user_id: UserId,
}

#[derive(Serialize)]
struct UpdateFeedbackRequest<'a> {
    title: &'a str,
    message: &'a str,
}

#[derive(Clone)]
pub struct FeedbackApiClient {
    client: Client,
    base_url: Url,
}

impl FeedbackApiClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        http::join(&self.base_url, path)
    }
}

#[async_trait]
impl FeedbackTransport for FeedbackApiClient {
    async fn list_all(&self, credential: &Credential) -> Result<Vec<FeedbackItem>, TransportError> {
        let endpoint = "GET /feedback";
        let request = self
            .client
            .get(self.url("feedback"))
            .header(AUTHORIZATION, credential.bearer());

        let response = http::send(endpoint, request).await?;
        http::read_json(endpoint, response).await
    }

    async fn create(
        &self,
        credential: &Credential,
        draft: &FeedbackDraft,
        owner: UserId,
    ) -> Result<FeedbackItem, TransportError> {
        let endpoint = "POST /feedback";
        let body = CreateFeedbackRequest {
            title: &draft.title,
            message: &draft.body,
            user_id: owner,
        };
        let request = self
            .client
            .post(self.url("feedback"))
            .header(AUTHORIZATION, credential.bearer())
            .json(&body);

        let response = http::send(endpoint, request).await?;
        http::read_json(endpoint, response).await
    }

    async fn update(
        &self,
        credential: &Credential,
        id: FeedbackId,
        patch: &FeedbackPatch,
    ) -> Result<FeedbackItem, TransportError> {
        let endpoint = format!("PUT /feedback/{id}");
        let body = UpdateFeedbackRequest {
            title: &patch.title,
            message: &patch.body,
        };
        let request = self
            .client
            .put(self.url(&format!("feedback/{id}")))
            .header(AUTHORIZATION, credential.bearer())
            .json(&body);

        let response = http::send(&endpoint, request).await?;
        http::read_json(&endpoint, response).await
    }

    async fn delete(&self, credential: &Credential, id: FeedbackId) -> Result<(), TransportError> {
        let endpoint = format!("DELETE /feedback/{id}");
        let request = self
            .client
            .delete(self.url(&format!("feedback/{id}")))
            .header(AUTHORIZATION, credential.bearer());

        // 204 with an empty body; nothing to decode.
        http::send(&endpoint, request).await?;
        Ok(())
    }
}
