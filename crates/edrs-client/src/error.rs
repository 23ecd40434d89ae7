//! Error types for the EDRS client.

use crate::request::Method;

/// Network-class failure: no HTTP response was received.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The per-call timeout elapsed.
    #[error("request timed out")]
    Timeout,

    /// Connection could not be established or was dropped.
    #[error("connection failed: {0}")]
    Connect(String),

    /// I/O error while sending or reading.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Any other failure reported by the HTTP stack.
    #[error("{0}")]
    Other(String),
}

/// Error from an API call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Backend rejected the session (HTTP 401).
    #[error("{method} {url}: unauthorized (request {request_id})")]
    Unauthorized {
        /// HTTP method.
        method: Method,
        /// Request URL.
        url: String,
        /// Value of `X-Request-ID`.
        request_id: String,
        /// Server-provided message, if any.
        message: Option<String>,
    },

    /// Backend returned a non-success status.
    #[error("{method} {url}: HTTP {status} (request {request_id})")]
    Http {
        /// HTTP method.
        method: Method,
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Server-provided message (`message`, `detail` or `error` field).
        message: Option<String>,
        /// Raw response body.
        body: String,
        /// Value of `X-Request-ID`.
        request_id: String,
    },

    /// No response was received.
    #[error("{method} {url}: network error (request {request_id})")]
    Network {
        /// HTTP method.
        method: Method,
        /// Request URL.
        url: String,
        /// Value of `X-Request-ID`.
        request_id: String,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// No usable backend URL for the active mode.
    #[error("base URL error: {0}")]
    BaseUrl(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status, when the backend answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Request identifier, when the request was issued.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { request_id, .. }
            | Self::Http { request_id, .. }
            | Self::Network { request_id, .. } => Some(request_id),
            _ => None,
        }
    }

    /// Server-provided message, when one was sent.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message, .. } | Self::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Error persisting session state.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// I/O error writing the session file.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Session could not be serialized.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
}
