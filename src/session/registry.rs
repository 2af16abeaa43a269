//! Registry of live sessions.
//!
//! The registry keeps, per session token:
//! - the base URL of the server that issued it (always ending with `/`)
//! - the username used to authenticate (may be empty)
//! - the cumulative number of bytes downloaded
//! - the order in which sessions were connected
//!
//! The reserved local session is never registered. Its base URL is fixed at
//! construction and its download counter lives next to the map.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::ClientError;

use super::{normalize_base_url, LOCAL_SESSION_ID};

/// A registered remote session.
#[derive(Debug, Clone)]
struct Session {
    base_url: String,
    username: String,
    downloaded_bytes: u64,
    /// Position in connection order; higher is more recent
    sequence: u64,
}

/// Snapshot of a session, as reported by `who_am_i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    /// `None` for the local session, which has no user
    pub username: Option<String>,
    pub url: String,
    pub downloaded_bytes: u64,
}

/// Registry mapping session tokens to their server and bookkeeping.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Session>>,
    next_sequence: AtomicU64,
    local_url: String,
    local_downloaded_bytes: AtomicU64,
}

impl SessionRegistry {
    /// Create an empty registry whose local session points at `local_url`.
    pub fn new(local_url: &str) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_sequence: AtomicU64::new(0),
            local_url: normalize_base_url(local_url),
            local_downloaded_bytes: AtomicU64::new(0),
        }
    }

    /// Base URL of the reserved local instance.
    pub fn local_url(&self) -> &str {
        &self.local_url
    }

    /// Register a session obtained from a successful authentication.
    ///
    /// Registering an existing token again refreshes its URL and username,
    /// resets its counter and makes it the most recent session.
    pub async fn register(&self, token: &str, base_url: &str, username: &str) {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let session = Session {
            base_url: normalize_base_url(base_url),
            username: username.to_string(),
            downloaded_bytes: 0,
            sequence,
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(token.to_string(), session);
        info!(session = token, url = base_url, "Session registered");
    }

    /// Remove a session. Returns whether it was registered.
    pub async fn remove(&self, token: &str) -> bool {
        let removed = self.sessions.write().await.remove(token).is_some();
        if removed {
            info!(session = token, "Session removed");
        }
        removed
    }

    /// Whether the token belongs to a registered session.
    pub async fn contains(&self, token: &str) -> bool {
        self.sessions.read().await.contains_key(token)
    }

    /// Number of registered sessions (the local session is never counted).
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session is registered.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// The most recently connected session still registered.
    pub async fn most_recent(&self) -> Option<String> {
        let sessions = self.sessions.read().await;
        sessions
            .iter()
            .max_by_key(|(_, session)| session.sequence)
            .map(|(token, _)| token.clone())
    }

    /// Base URL for a token, guaranteed to end with `/`.
    pub async fn base_url(&self, token: &str) -> Result<String, ClientError> {
        if token == LOCAL_SESSION_ID {
            return Ok(self.local_url.clone());
        }

        let sessions = self.sessions.read().await;
        match sessions.get(token) {
            Some(session) => Ok(session.base_url.clone()),
            None => {
                debug!(session = token, "Base URL requested for unknown session");
                Err(ClientError::InvalidSession(token.to_string()))
            }
        }
    }

    /// Add `n` bytes to a session's download counter.
    ///
    /// Unknown tokens are ignored.
    pub async fn record_downloaded_bytes(&self, token: &str, n: u64) {
        if token == LOCAL_SESSION_ID {
            self.local_downloaded_bytes.fetch_add(n, Ordering::Relaxed);
            return;
        }

        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(token) {
            session.downloaded_bytes += n;
        }
    }

    /// Bytes downloaded so far by a session.
    pub async fn downloaded_bytes(&self, token: &str) -> Option<u64> {
        if token == LOCAL_SESSION_ID {
            return Some(self.local_downloaded_bytes.load(Ordering::Relaxed));
        }
        self.sessions
            .read()
            .await
            .get(token)
            .map(|session| session.downloaded_bytes)
    }

    /// Snapshot of a session's bookkeeping.
    pub async fn info(&self, token: &str) -> Option<SessionInfo> {
        if token == LOCAL_SESSION_ID {
            return Some(SessionInfo {
                session_id: LOCAL_SESSION_ID.to_string(),
                username: None,
                url: self.local_url.clone(),
                downloaded_bytes: self.local_downloaded_bytes.load(Ordering::Relaxed),
            });
        }

        let sessions = self.sessions.read().await;
        sessions.get(token).map(|session| SessionInfo {
            session_id: token.to_string(),
            username: Some(session.username.clone()),
            url: session.base_url.clone(),
            downloaded_bytes: session.downloaded_bytes,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
