//! HTTP client for a peer's remote-get endpoint.

use std::time::Duration;

use roster_db::models::remote::RemoteSite;

use crate::document::SyncDocument;

/// Path of the remote-get endpoint, relative to the site URL.
pub const REMOTE_GET_PATH: &str = "/api/v1/remote/get";

/// Default timeout for fetching a peer document.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from fetching a peer document.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The peer returned a non-2xx status code.
    #[error("Remote site returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not a sync document.
    #[error("Unable to decode sync document: {0}")]
    Decode(String),
}

/// Client fetching [`SyncDocument`]s from peer sites.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: reqwest::Client,
}

impl RemoteClient {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// URL of the document the peer serves for this site's secret.
    pub fn document_url(site: &RemoteSite) -> String {
        format!("{}{}/{}", site.base_url(), REMOTE_GET_PATH, site.secret)
    }

    /// `GET {site.url}/api/v1/remote/get/{secret}` and decode the body.
    pub async fn fetch_document(&self, site: &RemoteSite) -> Result<SyncDocument, TransportError> {
        let response = self.client.get(Self::document_url(site)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
    }
}
