//! Client facade over the slide server.
//!
//! A [`Client`] owns all mutable state of the SDK: the session registry,
//! the metadata cache and the configuration. Several independent clients
//! can live in one process.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                            Client                             │
//! │  connection  metadata  hierarchy  images  pass-through        │
//! └───────┬────────────────────────┬───────────────────┬──────────┘
//!         │ resolve token          │ cache lookup      │ fetch
//!         ▼                        ▼                   ▼
//! ┌───────────────────┐  ┌───────────────────┐  ┌───────────────┐
//! │  SessionRegistry  │  │   MetadataCache   │  │   Transport   │
//! └───────────────────┘  └───────────────────┘  └───────┬───────┘
//!                                                       │ body
//!                                                       ▼
//!                                              ┌─────────────────┐
//!                                              │ classify(body)  │
//!                                              └─────────────────┘
//! ```
//!
//! Every operation takes an optional session token. When it is omitted the
//! most recently connected session is used, falling back to the local
//! instance if one is running.

mod connection;
mod extras;
mod hierarchy;
mod images;
mod metadata;

use std::sync::Arc;

use bytes::Bytes;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::metadata::MetadataCache;
use crate::response::{classify, ResponseBody};
use crate::session::{SessionRegistry, LOCAL_SESSION_ID};
use crate::transport::{HttpTransport, Transport, TransportRequest};
use crate::urls::API_JSON;

pub use extras::SlideFile;
pub use hierarchy::Depth;

/// Client for one or more slide server sessions.
pub struct Client<T: Transport = HttpTransport> {
    transport: Arc<T>,
    config: ClientConfig,
    sessions: SessionRegistry,
    cache: MetadataCache,
}

impl Client<HttpTransport> {
    /// Create a client using HTTP and the default configuration.
    pub fn new() -> Self {
        Self::with_transport(HttpTransport::new())
    }
}

impl Default for Client<HttpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Client<T> {
    /// Create a client with a custom transport and the default configuration.
    pub fn with_transport(transport: T) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    /// Create a client with a custom transport and configuration.
    pub fn with_config(transport: T, config: ClientConfig) -> Self {
        let sessions = SessionRegistry::new(&config.local_url);
        Self {
            transport: Arc::new(transport),
            config,
            sessions,
            cache: MetadataCache::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The session registry, for inspection.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// The metadata cache, for inspection.
    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // =========================================================================
    // Token resolution
    // =========================================================================

    /// Resolve an optional token to the session an operation should use.
    ///
    /// An explicit token is returned unchanged. Otherwise the most recently
    /// connected session is used; with no session registered the local
    /// instance is asked through `IsLite`. Returns `None` when nothing is available.
    pub async fn resolve_token(&self, token: Option<&str>) -> Option<String> {
        if let Some(token) = token {
            return Some(token.to_string());
        }
        if let Some(token) = self.sessions.most_recent().await {
            return Some(token);
        }
        if self.is_lite(None).await == Some(true) {
            return Some(LOCAL_SESSION_ID.to_string());
        }
        None
    }

    /// Like [`resolve_token`](Self::resolve_token), but failing with
    /// [`ClientError::NoSession`] when nothing is available.
    pub(crate) async fn require_token(&self, token: Option<&str>) -> Result<String, ClientError> {
        self.resolve_token(token).await.ok_or(ClientError::NoSession)
    }

    /// Base URL of a session, always ending with `/`.
    pub async fn base_url(&self, token: Option<&str>) -> Result<String, ClientError> {
        let token = self.require_token(token).await?;
        self.sessions.base_url(&token).await
    }

    /// Base URL of the JSON API of a resolved session.
    pub(crate) async fn api_url(&self, token: &str) -> Result<String, ClientError> {
        let base = self.sessions.base_url(token).await?;
        Ok(format!("{}{}", base, API_JSON))
    }

    // =========================================================================
    // Exchanges
    // =========================================================================

    /// Issue a request without session bookkeeping.
    pub(crate) async fn send(&self, request: TransportRequest) -> Result<Bytes, ClientError> {
        Ok(self.transport.fetch(&request).await?)
    }

    /// Issue a request on behalf of a session and count the downloaded bytes.
    pub(crate) async fn send_for(
        &self,
        token: &str,
        request: TransportRequest,
    ) -> Result<Bytes, ClientError> {
        let body = self.send(request).await?;
        self.sessions
            .record_downloaded_bytes(token, body.len() as u64)
            .await;
        Ok(body)
    }

    /// GET a JSON endpoint on behalf of a session and classify the answer.
    ///
    /// Server-signalled failures become [`ClientError::Server`] with
    /// `context` naming the call.
    pub(crate) async fn get_payload(
        &self,
        token: &str,
        url: String,
        context: &str,
    ) -> Result<ResponseBody, ClientError> {
        let body = self.send_for(token, TransportRequest::get(url)).await?;
        classify(&String::from_utf8_lossy(&body)).into_payload(context)
    }

    /// POST a JSON body on behalf of a session and classify the answer.
    pub(crate) async fn post_payload(
        &self,
        token: &str,
        url: String,
        json: String,
        context: &str,
    ) -> Result<ResponseBody, ClientError> {
        let body = self
            .send_for(token, TransportRequest::post_json(url, json))
            .await?;
        classify(&String::from_utf8_lossy(&body)).into_payload(context)
    }
}
