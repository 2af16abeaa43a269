//! Per-session store of slide metadata documents.
//!
//! Documents are kept for the lifetime of their session and never evicted.
//! A document may be reachable under several keys (requested reference,
//! server filename, server UID); all keys share one `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::SlideInfo;

/// Metadata documents indexed by session token, then by slide reference.
#[derive(Default)]
pub struct MetadataCache {
    sessions: RwLock<HashMap<String, HashMap<String, Arc<SlideInfo>>>>,
}

impl MetadataCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a document by normalized reference.
    pub async fn get(&self, token: &str, key: &str) -> Option<Arc<SlideInfo>> {
        let sessions = self.sessions.read().await;
        sessions.get(token)?.get(key).cloned()
    }

    /// Whether a document is cached under `key`.
    pub async fn contains(&self, token: &str, key: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .map(|docs| docs.contains_key(key))
            .unwrap_or(false)
    }

    /// Store a document under every non-empty key.
    ///
    /// Keys that already hold a document keep it. Returns the document now
    /// stored under the first key, or the new document if every key was empty.
    pub async fn insert<I, K>(&self, token: &str, keys: I, info: SlideInfo) -> Arc<SlideInfo>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let info = Arc::new(info);
        let mut stored: Option<Arc<SlideInfo>> = None;

        let mut sessions = self.sessions.write().await;
        let docs = sessions.entry(token.to_string()).or_default();
        for key in keys {
            let key = key.into();
            if key.is_empty() {
                continue;
            }
            let entry = docs.entry(key).or_insert_with(|| Arc::clone(&info));
            if stored.is_none() {
                stored = Some(Arc::clone(entry));
            }
        }

        stored.unwrap_or(info)
    }

    /// Drop every document of a session. Returns whether anything was cached.
    pub async fn remove_session(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Number of keys cached for a session.
    pub async fn len(&self, token: &str) -> usize {
        let sessions = self.sessions.read().await;
        sessions.get(token).map(HashMap::len).unwrap_or(0)
    }
}
