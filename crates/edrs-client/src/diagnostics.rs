//! Backend connection diagnostics.
//!
//! Probes a fixed set of endpoints through the normal client pipeline and
//! summarizes what is reachable.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::request::ApiRequest;
use crate::session::Session;

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    /// Endpoint answered, but not with what a healthy backend returns.
    Partial,
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pass => "PASS",
            Self::Partial => "PARTIAL",
            Self::Fail => "FAIL",
        })
    }
}

/// One probed endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub endpoint: &'static str,
    pub status: CheckStatus,
    pub detail: String,
}

impl CheckResult {
    fn new(
        name: &'static str,
        endpoint: &'static str,
        status: CheckStatus,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            name,
            endpoint,
            status,
            detail: detail.into(),
        }
    }
}

/// All checks for one backend.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsReport {
    pub api_url: String,
    pub checks: Vec<CheckResult>,
}

impl DiagnosticsReport {
    /// PASS if every check passed, FAIL if none passed even partially,
    /// PARTIAL otherwise.
    #[must_use]
    pub fn overall(&self) -> CheckStatus {
        if self.checks.iter().all(|c| c.status == CheckStatus::Pass) {
            CheckStatus::Pass
        } else if self.checks.iter().all(|c| c.status == CheckStatus::Fail) {
            CheckStatus::Fail
        } else {
            CheckStatus::Partial
        }
    }
}

/// Run every check in order.
pub fn run_diagnostics(client: &ApiClient, session: &Session) -> DiagnosticsReport {
    let checks = vec![
        check_health(client, session),
        check_schema(client, session),
        check_database(client, session),
        check_categories(client, session),
        check_auth(client, session),
    ];

    for check in &checks {
        info!(check = check.name, status = %check.status, "{}", check.detail);
    }

    DiagnosticsReport {
        api_url: client.base_url().api().to_owned(),
        checks,
    }
}

fn failed(name: &'static str, endpoint: &'static str, err: &ApiError) -> CheckResult {
    let detail = match (err.status(), err.server_message()) {
        (Some(status), Some(message)) => format!("HTTP {status}: {message}"),
        (Some(status), None) => format!("HTTP {status}"),
        _ => err.to_string(),
    };
    CheckResult::new(name, endpoint, CheckStatus::Fail, detail)
}

fn get_value(
    client: &ApiClient,
    session: &Session,
    request: ApiRequest,
) -> Result<Option<Value>, ApiError> {
    let response = client.execute(session, request)?;
    Ok(serde_json::from_str(&response.body).ok())
}

fn check_health(client: &ApiClient, session: &Session) -> CheckResult {
    const NAME: &str = "health";
    const ENDPOINT: &str = "/health/";

    match get_value(client, session, ApiRequest::get(ENDPOINT).at_origin()) {
        Ok(Some(body)) => {
            let label = ["status", "service"]
                .iter()
                .find_map(|key| body.get(key).and_then(Value::as_str));
            match label {
                Some(label) => CheckResult::new(NAME, ENDPOINT, CheckStatus::Pass, label),
                None => CheckResult::new(
                    NAME,
                    ENDPOINT,
                    CheckStatus::Partial,
                    "response has no status or service",
                ),
            }
        }
        Ok(None) => CheckResult::new(NAME, ENDPOINT, CheckStatus::Partial, "response is not JSON"),
        Err(err) => failed(NAME, ENDPOINT, &err),
    }
}

fn check_schema(client: &ApiClient, session: &Session) -> CheckResult {
    const NAME: &str = "schema";
    const ENDPOINT: &str = "/api/schema/";

    match client.schema(session) {
        Ok(response) => CheckResult::new(
            NAME,
            ENDPOINT,
            CheckStatus::Pass,
            format!("{} bytes", response.body.len()),
        ),
        Err(err) => failed(NAME, ENDPOINT, &err),
    }
}

fn check_database(client: &ApiClient, session: &Session) -> CheckResult {
    const NAME: &str = "database";
    const ENDPOINT: &str = "/api/core/database/health/";

    match get_value(client, session, ApiRequest::get("/core/database/health/")) {
        Ok(Some(body)) => match body
            .pointer("/data/postgresql_version")
            .and_then(Value::as_str)
        {
            Some(version) => CheckResult::new(
                NAME,
                ENDPOINT,
                CheckStatus::Pass,
                format!("PostgreSQL {version}"),
            ),
            None => CheckResult::new(
                NAME,
                ENDPOINT,
                CheckStatus::Partial,
                "response has no data.postgresql_version",
            ),
        },
        Ok(None) => CheckResult::new(NAME, ENDPOINT, CheckStatus::Partial, "response is not JSON"),
        Err(err) => failed(NAME, ENDPOINT, &err),
    }
}

fn check_categories(client: &ApiClient, session: &Session) -> CheckResult {
    const NAME: &str = "categories";
    const ENDPOINT: &str = "/api/core/categories/";

    match get_value(client, session, ApiRequest::get("/core/categories/")) {
        Ok(Some(body)) => {
            let detail = match &body {
                Value::Array(items) => format!("{} categories", items.len()),
                Value::Object(map) => map
                    .get("count")
                    .and_then(Value::as_u64)
                    .map_or_else(|| "ok".to_owned(), |n| format!("{n} categories")),
                _ => "ok".to_owned(),
            };
            CheckResult::new(NAME, ENDPOINT, CheckStatus::Pass, detail)
        }
        Ok(None) => CheckResult::new(NAME, ENDPOINT, CheckStatus::Partial, "response is not JSON"),
        Err(err) => failed(NAME, ENDPOINT, &err),
    }
}

fn check_auth(client: &ApiClient, session: &Session) -> CheckResult {
    const NAME: &str = "auth";
    const ENDPOINT: &str = "/api/auth/";

    let options_err = match client.auth_options(session) {
        Ok(_) => return CheckResult::new(NAME, ENDPOINT, CheckStatus::Pass, "OPTIONS ok"),
        Err(err) => err,
    };

    let get_err = match client.execute(session, ApiRequest::get("/auth/")) {
        Ok(_) => return CheckResult::new(NAME, ENDPOINT, CheckStatus::Pass, "GET ok"),
        Err(err) => err,
    };

    let guarded = [&options_err, &get_err]
        .into_iter()
        .find_map(|err| err.status().filter(|s| matches!(*s, 401 | 403 | 405)));
    match guarded {
        Some(status) => CheckResult::new(
            NAME,
            ENDPOINT,
            CheckStatus::Partial,
            format!("reachable, HTTP {status}"),
        ),
        None => failed(NAME, ENDPOINT, &get_err),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::base_url::BaseUrl;
    use crate::policy::RetryPolicy;
    use crate::request::Method;
    use crate::transport::MockTransport;

    const ORIGIN: &str = "http://localhost:8000";

    fn client(transport: MockTransport) -> ApiClient {
        ApiClient::builder(BaseUrl::new(ORIGIN, "/api"))
            .transport(transport)
            .policy(RetryPolicy::new(0))
            .build()
    }

    fn healthy_backend() -> MockTransport {
        MockTransport::new()
            .with_route(
                Method::Get,
                format!("{ORIGIN}/health/"),
                200,
                r#"{"status":"healthy","service":"edrs"}"#,
            )
            .with_route(Method::Get, format!("{ORIGIN}/api/schema/"), 200, "openapi: 3.0.3")
            .with_route(
                Method::Get,
                format!("{ORIGIN}/api/core/database/health/"),
                200,
                r#"{"status":"ok","data":{"postgresql_version":"16.2"}}"#,
            )
            .with_route(
                Method::Get,
                format!("{ORIGIN}/api/core/categories/"),
                200,
                r#"[{"id":1,"name":"Contracts"},{"id":2,"name":"Invoices"}]"#,
            )
            .with_route(Method::Options, format!("{ORIGIN}/api/auth/"), 200, "{}")
    }

    fn status_of(report: &DiagnosticsReport, name: &str) -> CheckStatus {
        report
            .checks
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.status)
            .unwrap()
    }

    #[test]
    fn test_all_pass() {
        let report = run_diagnostics(&client(healthy_backend()), &Session::in_memory());

        assert_eq!(report.api_url, "http://localhost:8000/api");
        assert_eq!(report.checks.len(), 5);
        assert_eq!(report.overall(), CheckStatus::Pass);
        assert_eq!(report.checks[0].detail, "healthy");
        assert_eq!(report.checks[2].detail, "PostgreSQL 16.2");
        assert_eq!(report.checks[3].detail, "2 categories");
    }

    #[test]
    fn test_health_with_service_only_passes() {
        let transport = MockTransport::new().with_route(
            Method::Get,
            format!("{ORIGIN}/health/"),
            200,
            r#"{"service":"edrs"}"#,
        );

        let report = run_diagnostics(&client(transport), &Session::in_memory());

        assert_eq!(status_of(&report, "health"), CheckStatus::Pass);
        assert_eq!(report.overall(), CheckStatus::Partial);
    }

    #[test]
    fn test_health_without_fields_is_partial() {
        let transport = MockTransport::new().with_route(
            Method::Get,
            format!("{ORIGIN}/health/"),
            200,
            r#"{"uptime":12}"#,
        );

        let report = run_diagnostics(&client(transport), &Session::in_memory());

        assert_eq!(status_of(&report, "health"), CheckStatus::Partial);
    }

    #[test]
    fn test_database_without_version_is_partial() {
        let transport = healthy_backend().with_route(
            Method::Get,
            format!("{ORIGIN}/api/core/database/health/"),
            200,
            r#"{"status":"ok"}"#,
        );

        let report = run_diagnostics(&client(transport), &Session::in_memory());

        assert_eq!(status_of(&report, "database"), CheckStatus::Partial);
        assert_eq!(report.overall(), CheckStatus::Partial);
    }

    #[test]
    fn test_auth_guarded_is_partial() {
        let transport = MockTransport::new()
            .with_route(Method::Options, format!("{ORIGIN}/api/auth/"), 405, "{}")
            .with_route(Method::Get, format!("{ORIGIN}/api/auth/"), 403, "{}");

        let report = run_diagnostics(&client(transport), &Session::in_memory());

        assert_eq!(status_of(&report, "auth"), CheckStatus::Partial);
    }

    #[test]
    fn test_auth_falls_back_to_get() {
        let transport = MockTransport::new()
            .with_route(Method::Options, format!("{ORIGIN}/api/auth/"), 500, "")
            .with_route(Method::Get, format!("{ORIGIN}/api/auth/"), 200, "{}");

        let report = run_diagnostics(&client(transport), &Session::in_memory());

        assert_eq!(status_of(&report, "auth"), CheckStatus::Pass);
    }

    #[test]
    fn test_unreachable_backend_fails() {
        let report = run_diagnostics(&client(MockTransport::new()), &Session::in_memory());

        assert_eq!(report.overall(), CheckStatus::Fail);
        assert_eq!(report.checks[0].detail, "HTTP 404: Not found.");
    }
}
