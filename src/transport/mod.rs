//! Transport seam between the client and the slide server.
//!
//! The client never talks to the network directly; every exchange goes
//! through a [`Transport`]. Production code uses [`HttpTransport`], tests
//! substitute an in-memory implementation.

mod http;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;

pub use http::HttpTransport;

/// Content type used for JSON request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP method of a transport request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A single request handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub url: String,
    pub method: Method,
    pub body: Option<String>,
    pub content_type: Option<&'static str>,
}

impl TransportRequest {
    /// A GET request expecting a JSON answer.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            body: None,
            content_type: Some(JSON_CONTENT_TYPE),
        }
    }

    /// A POST request carrying a JSON body.
    pub fn post_json(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Post,
            body: Some(body.into()),
            content_type: Some(JSON_CONTENT_TYPE),
        }
    }

    /// A GET request for binary content (tiles, thumbnails, labels).
    pub fn get_binary(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            body: None,
            content_type: None,
        }
    }
}

/// Performs a single exchange with the slide server.
///
/// Implementations return the raw response body. Status codes are not
/// interpreted: the server reports failures inside the body, and the
/// response classifier decides what they mean.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue the request and return the response body.
    async fn fetch(&self, request: &TransportRequest) -> Result<Bytes, TransportError>;
}
