//! HTTP transports.
//!
//! The client never talks to the network directly; it hands a fully
//! augmented [`RequestContext`] to a [`Transport`].

mod http;
#[cfg(any(test, feature = "mock"))]
mod mock;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;
pub use http::UreqTransport;

use std::sync::Arc;

use crate::error::TransportError;
use crate::request::{ApiResponse, RequestContext};

/// Sends one request and returns whatever the backend answered.
///
/// Any HTTP status is a successful send; only failures to obtain a response
/// are errors.
pub trait Transport: Send + Sync {
    /// Send `ctx` as-is.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on timeout, connection or I/O failure.
    fn send(&self, ctx: &RequestContext) -> Result<ApiResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, ctx: &RequestContext) -> Result<ApiResponse, TransportError> {
        (**self).send(ctx)
    }
}
