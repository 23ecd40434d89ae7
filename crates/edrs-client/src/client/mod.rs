//! EDRS API client.
//!
//! Blocking client; share it across threads to keep several requests in
//! flight. Retry state lives in each call's [`RequestContext`], so concurrent
//! calls never see each other's budget.

mod endpoints;

use std::time::Duration;

use edrs_config::{ApiConfig, Mode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::augment::augment;
use crate::base_url::{BaseUrl, resolve_base_url, resolve_mode};
use crate::error::{ApiError, TransportError};
use crate::policy::{AuthFailureHook, Decision, Failure, RetryPolicy, Sleeper, ThreadSleeper};
use crate::request::{ApiRequest, ApiResponse, RequestContext};
use crate::session::Session;
use crate::transport::{Transport, UreqTransport};

/// Default per-call timeout when none is configured.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// EDRS REST API client.
pub struct ApiClient {
    base_url: BaseUrl,
    transport: Box<dyn Transport>,
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
    auth_hook: Option<Box<dyn AuthFailureHook>>,
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    base_url: BaseUrl,
    timeout: Duration,
    transport: Option<Box<dyn Transport>>,
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
    auth_hook: Option<Box<dyn AuthFailureHook>>,
}

impl ApiClientBuilder {
    /// Per-call timeout for the default transport.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the HTTP transport.
    #[must_use]
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace how backoff delays are waited out.
    #[must_use]
    pub fn sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// Run `hook` after the session is invalidated by a 401.
    #[must_use]
    pub fn on_auth_failure(mut self, hook: impl AuthFailureHook + 'static) -> Self {
        self.auth_hook = Some(Box::new(hook));
        self
    }

    /// Build the client.
    #[must_use]
    pub fn build(self) -> ApiClient {
        let transport = self
            .transport
            .unwrap_or_else(|| Box::new(UreqTransport::new(self.timeout)));
        ApiClient {
            base_url: self.base_url,
            transport,
            policy: self.policy,
            sleeper: self.sleeper,
            auth_hook: self.auth_hook,
        }
    }
}

impl ApiClient {
    /// Start building a client for `base_url`.
    #[must_use]
    pub fn builder(base_url: BaseUrl) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            transport: None,
            policy: RetryPolicy::default(),
            sleeper: Box::new(ThreadSleeper),
            auth_hook: None,
        }
    }

    /// Client for the mode and URL selected by `api` and the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::BaseUrl`] if no backend URL can be resolved.
    pub fn from_config(api: &ApiConfig) -> Result<Self, ApiError> {
        let env = |key: &str| std::env::var(key).ok();
        let mode = resolve_mode(api, env);
        Ok(Self::configured(api, mode, env)?.build())
    }

    /// Builder pre-filled from `api` for `mode`, so callers can still inject
    /// a transport or auth hook.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::BaseUrl`] if no backend URL can be resolved.
    pub fn configured<F>(api: &ApiConfig, mode: Mode, env: F) -> Result<ApiClientBuilder, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = resolve_base_url(api, mode, env)?;
        debug!(%mode, api = base_url.api(), "resolved backend");
        Ok(Self::builder(base_url)
            .timeout(api.timeout_for(mode))
            .policy(RetryPolicy::new(api.max_retries)))
    }

    /// Backend location this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Send `request` through the full pipeline.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Unauthorized`] on the first 401; the session has been
    ///   invalidated and the auth hook has run.
    /// - [`ApiError::Http`] for any other non-2xx answer, after at most one
    ///   retry for 5xx.
    /// - [`ApiError::Network`] when no response arrived, after at most one
    ///   retry.
    pub fn execute(&self, session: &Session, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.base_url.join(request.scope, &request.path);
        let mut ctx = RequestContext::new(request, url, self.policy.max_retries());
        augment(&mut ctx, session.token().as_deref());

        loop {
            debug!(
                method = %ctx.method,
                url = %ctx.url,
                request_id = %ctx.request_id,
                "sending request"
            );

            match self.transport.send(&ctx) {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => match self.policy.decide(&mut ctx, &Failure::Status(&response)) {
                    Decision::Retry(delay) => self.wait(&ctx, delay),
                    Decision::AuthFailed => return Err(self.auth_failed(session, &ctx, &response)),
                    Decision::Fail => return Err(status_error(&ctx, response)),
                },
                Err(err) => match self.policy.decide(&mut ctx, &Failure::Network(&err)) {
                    Decision::Retry(delay) => self.wait(&ctx, delay),
                    Decision::AuthFailed | Decision::Fail => return Err(network_error(&ctx, err)),
                },
            }
        }
    }

    /// `GET` an API path and decode the JSON body.
    pub fn get_json<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
    ) -> Result<T, ApiError> {
        self.execute(session, ApiRequest::get(path))?.json()
    }

    /// `OPTIONS` an API path.
    pub fn options(&self, session: &Session, path: &str) -> Result<ApiResponse, ApiError> {
        self.execute(session, ApiRequest::options(path))
    }

    /// `POST` a JSON body to an API path and decode the JSON answer.
    pub fn post_json<B, T>(&self, session: &Session, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(session, ApiRequest::post(path).json(body)?)?
            .json()
    }

    fn wait(&self, ctx: &RequestContext, delay: Duration) {
        warn!(
            method = %ctx.method,
            url = %ctx.url,
            request_id = %ctx.request_id,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            remaining = ctx.retries,
            "transient failure, retrying"
        );
        self.sleeper.sleep(delay);
    }

    fn auth_failed(
        &self,
        session: &Session,
        ctx: &RequestContext,
        response: &ApiResponse,
    ) -> ApiError {
        warn!(
            method = %ctx.method,
            url = %ctx.url,
            request_id = %ctx.request_id,
            "session rejected, clearing credentials"
        );
        session.invalidate();
        if let Some(hook) = &self.auth_hook {
            hook.on_auth_failure(ctx);
        }
        ApiError::Unauthorized {
            method: ctx.method,
            url: ctx.url.clone(),
            request_id: ctx.request_id.clone(),
            message: response.server_message(),
        }
    }
}

fn status_error(ctx: &RequestContext, response: ApiResponse) -> ApiError {
    let message = response.server_message();
    error!(
        method = %ctx.method,
        url = %ctx.url,
        status = response.status,
        message = message.as_deref().unwrap_or(""),
        request_id = %ctx.request_id,
        "API request failed"
    );
    ApiError::Http {
        method: ctx.method,
        url: ctx.url.clone(),
        status: response.status,
        message,
        body: response.body,
        request_id: ctx.request_id.clone(),
    }
}

fn network_error(ctx: &RequestContext, err: TransportError) -> ApiError {
    error!(
        method = %ctx.method,
        url = %ctx.url,
        request_id = %ctx.request_id,
        "API request failed: {err}"
    );
    ApiError::Network {
        method: ctx.method,
        url: ctx.url.clone(),
        request_id: ctx.request_id.clone(),
        source: err,
    }
}
