//! Shared request plumbing for the HTTP adapters.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::TransportError;

pub(crate) fn build_client(timeout: Duration) -> Result<Client, TransportError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|source| TransportError::Http {
            endpoint: "client_init".into(),
            source,
        })
}

/// Send `request`, turning transport failures and non-2xx answers into errors.
pub(crate) async fn send(endpoint: &str, request: RequestBuilder) -> Result<Response, TransportError> {
    debug!(endpoint, "sending request");

    let response = request.send().await.map_err(|source| TransportError::Http {
        endpoint: endpoint.into(),
        source,
    })?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        warn!(endpoint, status, "request rejected");
        return Err(TransportError::status(endpoint, status, &body));
    }

    Ok(response)
}

pub(crate) async fn read_json<T: DeserializeOwned>(
    endpoint: &str,
    response: Response,
) -> Result<T, TransportError> {
    let bytes = response.bytes().await.map_err(|source| TransportError::Http {
        endpoint: endpoint.into(),
        source,
    })?;

    serde_json::from_slice(&bytes).map_err(|source| TransportError::Decode {
        endpoint: endpoint.into(),
        source,
    })
}

/// Join a path onto a base URL without losing any path the base already has.
pub(crate) fn join(base: &url::Url, path: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
