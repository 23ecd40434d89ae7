//! API client for the EDRS backend.
//!
//! Every call goes through one pipeline:
//!
//! 1. The target URL is built from a [`BaseUrl`] chosen by environment mode.
//! 2. The [augmenter](augment) adds JSON headers, the session's bearer token
//!    and an `X-Request-ID`.
//! 3. A [`Transport`] sends the request.
//! 4. Failures go to the [`RetryPolicy`]: a 401 invalidates the [`Session`]
//!    and runs the [`AuthFailureHook`]; 5xx and network errors are resubmitted
//!    once after a backoff delay; anything else is logged and returned.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use edrs_client::{ApiClient, Session};
//! use edrs_config::Config;
//!
//! let config = Config::load(None, None)?;
//! let client = ApiClient::from_config(&config.api)?;
//! let session = Session::in_memory();
//!
//! let health = client.health(&session)?;
//! println!("{:?}", health.status);
//! # Ok(())
//! # }
//! ```

pub mod augment;
mod base_url;
mod client;
pub mod diagnostics;
mod error;
mod policy;
mod request;
mod session;
pub mod transport;
mod types;

pub use base_url::{
    API_URL_ENV, BaseUrl, DEV_API_URL_ENV, MODE_ENV, PROD_API_URL_ENV, resolve_base_url,
    resolve_mode,
};
pub use client::{ApiClient, ApiClientBuilder};
pub use error::{ApiError, SessionError, TransportError};
pub use policy::{
    AuthFailureHook, Decision, Failure, LoginRedirect, Navigator, RetryPolicy, Sleeper,
    ThreadSleeper, default_backoff,
};
pub use request::{ApiRequest, ApiResponse, Headers, Method, RequestContext, Scope};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionData, SessionStore};
pub use transport::{Transport, UreqTransport};
pub use types::{DatabaseHealth, DatabaseInfo, HealthStatus};
#[cfg(any(test, feature = "mock"))]
pub use transport::MockTransport;
