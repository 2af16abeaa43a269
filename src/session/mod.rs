//! Session bookkeeping.
//!
//! A session is identified by an opaque token handed out by the server's
//! authentication exchange, or by the reserved local token that denotes a
//! same-machine lightweight instance.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │                 Client                  │
//! │   connect / disconnect / resolve token  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            SessionRegistry              │
//! │  token → base URL, username, counter    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Only the registry mutates session state; everything else goes through
//! its methods.

mod registry;

pub use registry::{SessionInfo, SessionRegistry};

/// Token of the reserved local instance.
pub const LOCAL_SESSION_ID: &str = "SDK.Rust";

/// Base URL of the reserved local instance.
pub const DEFAULT_LOCAL_URL: &str = "http://localhost:54001/";

/// Make sure a base URL ends with a path separator.
pub fn normalize_base_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}
