//! Scripted transport for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use super::Transport;
use crate::error::TransportError;
use crate::request::{ApiResponse, Method, RequestContext};

/// Transport that replays canned outcomes.
///
/// Queued outcomes are consumed first, in order. After the queue is empty,
/// routes answer by method and exact URL, indefinitely. Anything else gets a
/// 404. Every request is recorded.
///
/// # Example
///
/// ```ignore
/// let transport = MockTransport::new()
///     .with_response(500, "")
///     .with_route(Method::Get, "http://localhost:8000/health/", 200, r#"{"status":"healthy"}"#);
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    queue: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
    routes: HashMap<(Method, String), (u16, String)>,
    sent: Mutex<Vec<RequestContext>>,
}

impl MockTransport {
    /// Create a transport with nothing scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    #[must_use]
    pub fn with_response(self, status: u16, body: impl Into<String>) -> Self {
        self.push(Ok(ApiResponse::new(status, body)))
    }

    /// Queue a network failure.
    #[must_use]
    pub fn with_failure(self, err: TransportError) -> Self {
        self.push(Err(err))
    }

    /// Answer `method url` with a fixed response once the queue is drained.
    #[must_use]
    pub fn with_route(
        mut self,
        method: Method,
        url: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        self.routes
            .insert((method, url.into()), (status, body.into()));
        self
    }

    /// Requests sent so far, in order.
    pub fn sent(&self) -> Vec<RequestContext> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(self, outcome: Result<ApiResponse, TransportError>) -> Self {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(outcome);
        self
    }
}

impl Transport for MockTransport {
    fn send(&self, ctx: &RequestContext) -> Result<ApiResponse, TransportError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ctx.clone());

        if let Some(outcome) = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
        {
            return outcome;
        }

        let response = self
            .routes
            .get(&(ctx.method, ctx.url.clone()))
            .map_or_else(
                || ApiResponse::new(404, r#"{"detail":"Not found."}"#),
                |(status, body)| ApiResponse::new(*status, body.clone()),
            );
        Ok(response)
    }
}
