use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::debug;

use super::{Method, Transport, TransportRequest};
use crate::error::TransportError;

/// `reqwest`-backed implementation of [`Transport`].
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with reqwest's default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a transport whose requests give up after `timeout`.
    ///
    /// The client itself never times out; callers that need a deadline
    /// set it here.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing reqwest client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: &TransportRequest) -> Result<Bytes, TransportError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", request.url, e)))?;

        debug!(method = ?request.method, url = %url, "Sending request");

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };

        if let Some(content_type) = request.content_type {
            builder = builder.header(ACCEPT, content_type);
            if request.body.is_some() {
                builder = builder.header(CONTENT_TYPE, content_type);
            }
        }
        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))
    }
}
