//! Failure handling policy.
//!
//! [`RetryPolicy::decide`] is the state machine run on every failed attempt:
//!
//! ```text
//! INITIAL --2xx--> DONE
//! INITIAL --error--> ERROR --401, not retried-------------> AUTH_FAILED
//!                          --5xx/network, budget, not retried--> RETRY
//!                          --anything else------------------> DONE(fail)
//! ```
//!
//! The decision only mutates the request context. Side effects (session
//! invalidation, navigation, sleeping) are performed by the client through the
//! injected [`AuthFailureHook`] and [`Sleeper`].

use std::sync::Arc;
use std::time::Duration;

use crate::error::TransportError;
use crate::request::{ApiResponse, RequestContext};

/// A failed attempt.
#[derive(Debug, Clone, Copy)]
pub enum Failure<'a> {
    /// The backend answered with a non-2xx status.
    Status(&'a ApiResponse),
    /// No response was received.
    Network(&'a TransportError),
}

impl Failure<'_> {
    /// HTTP status, if the backend answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(response) => Some(response.status),
            Self::Network(_) => None,
        }
    }

    /// Network errors and 5xx responses.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status(response) => response.status >= 500,
            Self::Network(_) => true,
        }
    }
}

/// Outcome of a failure decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Wait, then resubmit the same request.
    Retry(Duration),
    /// Session rejected: invalidate it and propagate.
    AuthFailed,
    /// Terminal: log and propagate.
    Fail,
}

/// `2^(3 - remaining)` seconds.
///
/// `remaining` is the budget at the moment of the decision, before it is
/// decremented, so the delay grows as the budget is spent.
#[must_use]
pub fn default_backoff(remaining: u32) -> Duration {
    let exponent = 3_i32.saturating_sub(i32::try_from(remaining).unwrap_or(i32::MAX));
    Duration::from_secs_f64(2_f64.powi(exponent))
}

/// Retry budget and backoff function.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: fn(u32) -> Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

impl RetryPolicy {
    /// Policy with the given budget and [`default_backoff`].
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: default_backoff,
        }
    }

    /// Replace the backoff function.
    #[must_use]
    pub fn with_backoff(mut self, backoff: fn(u32) -> Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Budget each new request starts with.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Decide what to do after `failure`, updating `ctx`.
    ///
    /// Sets `ctx.retried` on [`Decision::AuthFailed`] and [`Decision::Retry`];
    /// decrements `ctx.retries` on [`Decision::Retry`] only. Once `retried` is
    /// set every later failure is [`Decision::Fail`].
    pub fn decide(&self, ctx: &mut RequestContext, failure: &Failure<'_>) -> Decision {
        if ctx.retried {
            return Decision::Fail;
        }

        if failure.status() == Some(401) {
            ctx.retried = true;
            return Decision::AuthFailed;
        }

        if failure.is_transient() && ctx.retries > 0 {
            let delay = (self.backoff)(ctx.retries);
            ctx.retried = true;
            ctx.retries -= 1;
            return Decision::Retry(delay);
        }

        Decision::Fail
    }
}

/// Called once per request when the backend rejects the session.
pub trait AuthFailureHook: Send + Sync {
    /// React to a 401 on `ctx`. The session has already been invalidated.
    fn on_auth_failure(&self, ctx: &RequestContext);
}

/// Route access for browser-hosted embeddings.
pub trait Navigator: Send + Sync {
    /// Path of the current route (e.g. `/documents`).
    fn current_path(&self) -> String;

    /// Navigate to `path`.
    fn navigate(&self, path: &str);
}

impl<T: Navigator + ?Sized> Navigator for Arc<T> {
    fn current_path(&self) -> String {
        (**self).current_path()
    }

    fn navigate(&self, path: &str) {
        (**self).navigate(path);
    }
}

/// Sends the user to the login route after a 401.
///
/// Only install this where a [`Navigator`] exists; headless callers leave the
/// hook unset and just get the error.
pub struct LoginRedirect<N> {
    navigator: N,
    login_path: String,
}

impl<N: Navigator> LoginRedirect<N> {
    /// Redirect to `/login`.
    #[must_use]
    pub fn new(navigator: N) -> Self {
        Self::with_path(navigator, "/login")
    }

    /// Redirect to a custom login route.
    #[must_use]
    pub fn with_path(navigator: N, login_path: impl Into<String>) -> Self {
        Self {
            navigator,
            login_path: login_path.into(),
        }
    }
}

impl<N: Navigator> AuthFailureHook for LoginRedirect<N> {
    fn on_auth_failure(&self, ctx: &RequestContext) {
        if self.navigator.current_path() == self.login_path {
            return;
        }
        tracing::info!(request_id = %ctx.request_id, "redirecting to {}", self.login_path);
        self.navigator.navigate(&self.login_path);
    }
}

/// Waits out a backoff delay.
pub trait Sleeper: Send + Sync {
    /// Block for `duration`.
    fn sleep(&self, duration: Duration);
}

impl<T: Sleeper + ?Sized> Sleeper for Arc<T> {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Blocks the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::request::{ApiRequest, Method};

    fn context(retries: u32) -> RequestContext {
        RequestContext::new(
            ApiRequest::new(Method::Get, "/core/database/health/"),
            "http://localhost:8000/api/core/database/health/".to_owned(),
            retries,
        )
    }

    #[test]
    fn test_default_backoff_formula() {
        assert_eq!(default_backoff(3), Duration::from_millis(1000));
        assert_eq!(default_backoff(2), Duration::from_millis(2000));
        assert_eq!(default_backoff(1), Duration::from_millis(4000));
        assert_eq!(default_backoff(0), Duration::from_millis(8000));
        assert_eq!(default_backoff(4), Duration::from_millis(500));
        assert_eq!(default_backoff(5), Duration::from_millis(250));
    }

    #[test]
    fn test_server_error_with_budget_retries() {
        let policy = RetryPolicy::new(3);
        let mut ctx = context(2);
        let response = ApiResponse::new(500, "");

        let decision = policy.decide(&mut ctx, &Failure::Status(&response));

        assert_eq!(decision, Decision::Retry(Duration::from_millis(2000)));
        assert!(ctx.retried);
        assert_eq!(ctx.retries, 1);
    }

    #[test]
    fn test_network_error_retries() {
        let policy = RetryPolicy::new(3);
        let mut ctx = context(3);
        let err = TransportError::Timeout;

        let decision = policy.decide(&mut ctx, &Failure::Network(&err));

        assert_eq!(decision, Decision::Retry(Duration::from_millis(1000)));
        assert_eq!(ctx.retries, 2);
    }

    #[test]
    fn test_no_retry_after_retried_even_with_budget() {
        let policy = RetryPolicy::new(3);
        let mut ctx = context(3);
        let response = ApiResponse::new(503, "");

        assert!(matches!(
            policy.decide(&mut ctx, &Failure::Status(&response)),
            Decision::Retry(_)
        ));
        assert_eq!(ctx.retries, 2);

        let decision = policy.decide(&mut ctx, &Failure::Status(&response));
        assert_eq!(decision, Decision::Fail);
        assert_eq!(ctx.retries, 2);
    }

    #[test]
    fn test_no_retry_without_budget() {
        let policy = RetryPolicy::new(0);
        let mut ctx = context(0);
        let response = ApiResponse::new(502, "");

        assert_eq!(
            policy.decide(&mut ctx, &Failure::Status(&response)),
            Decision::Fail
        );
        assert!(!ctx.retried);
        assert_eq!(ctx.retries, 0);
    }

    #[test]
    fn test_unauthorized_first_time() {
        let policy = RetryPolicy::new(3);
        let mut ctx = context(3);
        let response = ApiResponse::new(401, "");

        assert_eq!(
            policy.decide(&mut ctx, &Failure::Status(&response)),
            Decision::AuthFailed
        );
        assert!(ctx.retried);
        assert_eq!(ctx.retries, 3);
    }

    #[test]
    fn test_unauthorized_after_retry_is_plain_failure() {
        let policy = RetryPolicy::new(3);
        let mut ctx = context(3);
        ctx.retried = true;
        let response = ApiResponse::new(401, "");

        assert_eq!(
            policy.decide(&mut ctx, &Failure::Status(&response)),
            Decision::Fail
        );
    }

    #[test]
    fn test_client_error_is_terminal() {
        let policy = RetryPolicy::new(3);
        let mut ctx = context(3);
        let response = ApiResponse::new(404, "");

        assert_eq!(
            policy.decide(&mut ctx, &Failure::Status(&response)),
            Decision::Fail
        );
        assert!(!ctx.retried);
    }

    #[test]
    fn test_custom_backoff() {
        let policy = RetryPolicy::new(3).with_backoff(|_| Duration::ZERO);
        let mut ctx = context(3);
        let response = ApiResponse::new(500, "");

        assert_eq!(
            policy.decide(&mut ctx, &Failure::Status(&response)),
            Decision::Retry(Duration::ZERO)
        );
    }

    struct FakeNavigator {
        current: String,
        visited: Mutex<Vec<String>>,
    }

    impl Navigator for &FakeNavigator {
        fn current_path(&self) -> String {
            self.current.clone()
        }

        fn navigate(&self, path: &str) {
            self.visited.lock().unwrap().push(path.to_owned());
        }
    }

    #[test]
    fn test_login_redirect_navigates() {
        let navigator = FakeNavigator {
            current: "/documents".to_owned(),
            visited: Mutex::new(Vec::new()),
        };
        let hook = LoginRedirect::new(&navigator);

        hook.on_auth_failure(&context(3));

        assert_eq!(*navigator.visited.lock().unwrap(), vec!["/login".to_owned()]);
    }

    #[test]
    fn test_login_redirect_skips_when_on_login() {
        let navigator = FakeNavigator {
            current: "/login".to_owned(),
            visited: Mutex::new(Vec::new()),
        };
        let hook = LoginRedirect::new(&navigator);

        hook.on_auth_failure(&context(3));

        assert!(navigator.visited.lock().unwrap().is_empty());
    }
}
