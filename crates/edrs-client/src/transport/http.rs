//! Blocking transport on top of `ureq`.

use std::time::Duration;

use ureq::Agent;

use super::Transport;
use crate::error::TransportError;
use crate::request::{ApiResponse, Headers, Method, RequestContext};

/// Production transport.
///
/// Status codes are returned as responses, not errors; the agent's global
/// timeout bounds each call.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Transport with the given per-call timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn send(&self, ctx: &RequestContext) -> Result<ApiResponse, TransportError> {
        let url = ctx.url.as_str();
        let body = ctx.body.as_deref().unwrap_or_default();

        let response = match ctx.method {
            Method::Get => with_headers(self.agent.get(url), &ctx.headers).call(),
            Method::Head => with_headers(self.agent.head(url), &ctx.headers).call(),
            Method::Options => with_headers(self.agent.options(url), &ctx.headers).call(),
            Method::Delete => with_headers(self.agent.delete(url), &ctx.headers).call(),
            Method::Post => with_headers(self.agent.post(url), &ctx.headers).send(body),
            Method::Put => with_headers(self.agent.put(url), &ctx.headers).send(body),
            Method::Patch => with_headers(self.agent.patch(url), &ctx.headers).send(body),
        }?;

        let status = response.status().as_u16();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.append(name.as_str(), value);
            }
        }

        let body = response.into_body().read_to_string()?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &Headers,
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers.iter() {
        builder = builder.header(name, value);
    }
    builder
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => Self::Timeout,
            ureq::Error::Io(e) => Self::Io(e),
            ureq::Error::ConnectionFailed => Self::Connect("no connection".to_owned()),
            ureq::Error::HostNotFound => Self::Connect("host not found".to_owned()),
            other => Self::Other(other.to_string()),
        }
    }
}
