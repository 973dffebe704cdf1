//! Sign-in plumbing: talks to the service's `/login` and `/register`
//! endpoints and keeps the session file the core reads.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use asktracker_core::error::extract_detail;
use asktracker_core::{Identity, SessionRecord};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

pub struct AuthClient {
    client: Client,
    base_url: Url,
}

impl AuthClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionRecord> {
        debug!(email, "logging in");
        let response = self
            .client
            .post(self.url("login"))
            .json(&LoginRequest { email, password })
            .send()
            .await
            .context("could not reach the feedback service")?;
        read(response, "login").await
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Identity> {
        debug!(email, "registering");
        let response = self
            .client
            .post(self.url("register"))
            .json(&RegisterRequest {
                name,
                email,
                password,
            })
            .send()
            .await
            .context("could not reach the feedback service")?;
        read(response, "registration").await
    }
}

async fn read<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let status = response.status();
    let body = response.text().await.context("failed to read response body")?;
    if !status.is_success() {
        bail!("{what} failed ({}): {}", status.as_u16(), extract_detail(&body));
    }
    serde_json::from_str(&body).with_context(|| format!("unexpected {what} response"))
}

pub fn store_session(record: &SessionRecord, path: &Path) -> Result<()> {
    record.save(path)?;
    info!(path = %path.display(), "session saved");
    Ok(())
}

pub fn clear_session(path: &Path) -> Result<bool> {
    Ok(SessionRecord::remove(path)?)
}
