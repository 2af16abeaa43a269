use thiserror::Error;

/// Errors raised by a [`Transport`](crate::transport::Transport) when the
/// exchange with the server could not be completed.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// The request URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The response body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// Errors returned by the slide server client.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The transport could not complete the exchange
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with an error code and message
    #[error("{context} resulted in: {message}")]
    Server { context: String, message: String },

    /// The token is neither registered nor the reserved local token
    #[error("Invalid sessionID: {0}")]
    InvalidSession(String),

    /// No session was supplied, none is registered and no local instance is running
    #[error("No session available: connect first or start a local instance")]
    NoSession,

    /// The operation is only offered by the full remote service
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// The response had a shape the operation cannot use
    #[error("Unexpected response from {context}: {detail}")]
    UnexpectedResponse { context: String, detail: String },

    /// A JSON payload could not be decoded into the expected type
    #[error("Failed to decode {context}: {message}")]
    Decode { context: String, message: String },

    /// A caller-supplied argument is out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ClientError {
    pub(crate) fn unexpected(context: impl Into<String>, detail: impl Into<String>) -> Self {
        ClientError::UnexpectedResponse {
            context: context.into(),
            detail: detail.into(),
        }
    }

    /// Whether this error came from the network rather than from the server's answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}
