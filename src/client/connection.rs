//! Server discovery and the session lifecycle.

use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ClientError;
use crate::metadata::value_as_u64;
use crate::response::{classify, ResponseBody};
use crate::session::{normalize_base_url, SessionInfo, LOCAL_SESSION_ID};
use crate::transport::{Transport, TransportRequest};
use crate::urls::{Query, API_JSON};

use super::Client;

impl<T: Transport> Client<T> {
    fn server_url(&self, url: Option<&str>) -> String {
        normalize_base_url(url.unwrap_or(&self.config.local_url))
    }

    fn is_local_url(&self, url: &str) -> bool {
        normalize_base_url(url) == self.sessions.local_url()
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    /// Ask a server whether it is the lightweight local instance.
    ///
    /// Returns `Some(true)` for the local instance, `Some(false)` for any
    /// other answering server and `None` when nothing answers. Defaults to
    /// the local endpoint.
    pub async fn is_lite(&self, url: Option<&str>) -> Option<bool> {
        let url = format!("{}{}IsLite", self.server_url(url), API_JSON);
        match self.send(TransportRequest::get(url.as_str())).await {
            Ok(body) => Some(String::from_utf8_lossy(&body).trim() == "true"),
            Err(e) => {
                debug!(url = %url, error = %e, "IsLite request failed");
                None
            }
        }
    }

    /// Version string of a server. Defaults to the local endpoint.
    ///
    /// Does not require a session.
    pub async fn version_info(&self, url: Option<&str>) -> Result<String, ClientError> {
        let url = format!("{}{}GetVersionInfo", self.server_url(url), API_JSON);
        let body = self.send(TransportRequest::get(url)).await?;
        classify(&String::from_utf8_lossy(&body))
            .into_payload("GetVersionInfo")?
            .into_scalar("GetVersionInfo")
    }

    /// API version of a server as its numeric components.
    pub async fn api_version(&self, url: Option<&str>) -> Result<Vec<u32>, ClientError> {
        let url = format!("{}{}GetAPIVersion", self.server_url(url), API_JSON);
        let body = self.send(TransportRequest::get(url)).await?;
        let items = classify(&String::from_utf8_lossy(&body))
            .into_payload("GetAPIVersion")?
            .into_array("GetAPIVersion")?;

        Ok(items
            .iter()
            .map(|item| {
                value_as_u64(item)
                    .and_then(|v| u32::try_from(v).ok())
                    .unwrap_or(0)
            })
            .collect())
    }

    /// API version of a server as a dotted string, e.g. `3.0.1`.
    pub async fn api_version_string(&self, url: Option<&str>) -> Result<String, ClientError> {
        let parts: Vec<String> = self
            .api_version(url)
            .await?
            .iter()
            .map(u32::to_string)
            .collect();
        Ok(parts.join("."))
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Open a session and return its token.
    ///
    /// `None` or the reserved local endpoint skips authentication: the local
    /// token is returned when a local instance answers `IsLite`. Any other
    /// URL goes through the authentication exchange and the session is
    /// registered only on success.
    pub async fn connect(
        &self,
        url: Option<&str>,
        username: &str,
        password: &str,
    ) -> Result<String, ClientError> {
        let url = self.server_url(url);

        if self.is_local_url(&url) {
            return match self.is_lite(None).await {
                Some(true) => {
                    info!(url = %url, "Connected to local instance");
                    Ok(LOCAL_SESSION_ID.to_string())
                }
                _ => {
                    warn!(url = %url, "No local instance detected");
                    Err(ClientError::NoSession)
                }
            };
        }

        Url::parse(&url)
            .map_err(|e| ClientError::InvalidArgument(format!("invalid server URL '{}': {}", url, e)))?;

        let request_url = Query::new(&url, &format!("{}authenticate", API_JSON))
            .param("caller", &self.config.caller)
            .opt_param("username", Some(username).filter(|u| !u.is_empty()))
            .opt_param("password", Some(password).filter(|p| !p.is_empty()))
            .build();

        let body = self.send(TransportRequest::get(request_url)).await?;
        let downloaded = body.len() as u64;
        let response = classify(&String::from_utf8_lossy(&body)).into_payload("authenticate")?;

        let ResponseBody::Object(object) = response else {
            return Err(ClientError::unexpected("authenticate", "expected an object"));
        };

        let success = match object.get("Success") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        };
        if !success {
            let reason = object
                .get("Reason")
                .and_then(Value::as_str)
                .unwrap_or("authentication was not successful");
            warn!(url = %url, username = username, reason = reason, "Authentication failed");
            return Err(ClientError::Server {
                context: "authenticate".to_string(),
                message: reason.to_string(),
            });
        }

        let token = object
            .get("SessionId")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::unexpected("authenticate", "missing SessionId"))?
            .to_string();

        self.sessions.register(&token, &url, username).await;
        self.sessions.record_downloaded_bytes(&token, downloaded).await;
        Ok(token)
    }

    /// Close a session.
    ///
    /// Returns whether a registered session was removed. The session's
    /// metadata cache is dropped either way, and a deauthentication request
    /// is sent whose outcome is ignored.
    pub async fn disconnect(&self, token: Option<&str>) -> bool {
        let Some(token) = self.resolve_token(token).await else {
            return false;
        };

        if let Ok(api) = self.api_url(&token).await {
            let url = Query::new(&api, "DeAuthenticate")
                .param("sessionID", &token)
                .build();
            if let Err(e) = self.send_for(&token, TransportRequest::get(url)).await {
                debug!(session = %token, error = %e, "DeAuthenticate failed");
            }
        }

        self.cache.remove_session(&token).await;
        self.sessions.remove(&token).await
    }

    /// Whether the session is valid and its server reachable.
    ///
    /// Always false on the local instance, which has no sessions to check.
    pub async fn ping(&self, token: Option<&str>) -> bool {
        let Some(token) = self.resolve_token(token).await else {
            return false;
        };
        let Ok(api) = self.api_url(&token).await else {
            return false;
        };

        let url = Query::new(&api, "Ping").param("sessionID", &token).build();
        match self.send_for(&token, TransportRequest::get(url)).await {
            Ok(body) => String::from_utf8_lossy(&body).trim() == "true",
            Err(e) => {
                debug!(session = %token, error = %e, "Ping failed");
                false
            }
        }
    }

    /// Bookkeeping snapshot of a session.
    pub async fn who_am_i(&self, token: Option<&str>) -> Result<SessionInfo, ClientError> {
        let token = self.require_token(token).await?;
        self.sessions
            .info(&token)
            .await
            .ok_or(ClientError::InvalidSession(token))
    }

    /// Bytes downloaded so far by a session.
    pub async fn downloaded_bytes(&self, token: Option<&str>) -> Result<u64, ClientError> {
        let token = self.require_token(token).await?;
        self.sessions
            .downloaded_bytes(&token)
            .await
            .ok_or(ClientError::InvalidSession(token))
    }

    /// Fail with [`ClientError::Unsupported`] on the local instance.
    pub(crate) fn ensure_remote(&self, token: &str, capability: &str) -> Result<(), ClientError> {
        if token == LOCAL_SESSION_ID {
            return Err(ClientError::Unsupported(format!(
                "local instance found running at {}, but it doesn't support {}",
                self.sessions.local_url(),
                capability
            )));
        }
        Ok(())
    }
}
