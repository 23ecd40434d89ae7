//! `edrs request` command implementation.

use clap::Args;
use edrs_client::{ApiError, ApiRequest, ApiResponse, Method};

use super::client_args::ClientArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the request command.
#[derive(Args)]
pub(crate) struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE, OPTIONS, HEAD).
    method: String,

    /// Path relative to the API base (e.g. /core/categories/).
    path: String,

    /// JSON request body.
    #[arg(short, long)]
    data: Option<String>,

    /// Extra header as `Name: value`. Repeatable.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Resolve the path against the backend origin instead of the API base.
    #[arg(long)]
    origin: bool,

    #[command(flatten)]
    client: ClientArgs,
}

impl RequestArgs {
    /// Execute the request command.
    ///
    /// # Errors
    ///
    /// Returns an error if arguments are invalid or the request fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let request = self.build_request()?;
        let config = self.client.load_config()?;
        let client = self.client.client(&config)?;
        let session = ClientArgs::session(&config);

        match client.execute(&session, request) {
            Ok(response) => {
                output.muted(&format!("HTTP {}", response.status));
                output.data(&render_body(&response));
                Ok(())
            }
            Err(err) => {
                if let ApiError::Unauthorized { .. } = err {
                    output.warning("Session rejected; stored credentials were cleared.");
                }
                if let ApiError::Http { body, .. } = &err
                    && !body.is_empty()
                {
                    output.data(body);
                }
                Err(err.into())
            }
        }
    }

    fn build_request(&self) -> Result<ApiRequest, CliError> {
        let method = Method::parse(&self.method)
            .ok_or_else(|| CliError::Validation(format!("unknown method: {}", self.method)))?;

        let mut request = ApiRequest::new(method, self.path.as_str());
        if self.origin {
            request = request.at_origin();
        }
        for header in &self.headers {
            let (name, value) = parse_header(header)?;
            request = request.header(name, value);
        }
        if let Some(data) = &self.data {
            let body: serde_json::Value = serde_json::from_str(data)?;
            request = request.json(&body)?;
        }
        Ok(request)
    }
}

fn parse_header(raw: &str) -> Result<(&str, &str), CliError> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value.trim())),
        _ => Err(CliError::Validation(format!(
            "invalid header '{raw}', expected 'Name: value'"
        ))),
    }
}

/// Pretty-print JSON bodies, pass anything else through.
fn render_body(response: &ApiResponse) -> String {
    serde_json::from_str::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| response.body.clone())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("X-Tenant: acme").unwrap(),
            ("X-Tenant", "acme")
        );
        assert_eq!(
            parse_header("Accept:text/csv").unwrap(),
            ("Accept", "text/csv")
        );
    }

    #[test]
    fn test_parse_header_invalid() {
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn test_render_body_pretty_json() {
        let response = ApiResponse::new(200, r#"{"id":1}"#);
        assert_eq!(render_body(&response), "{\n  \"id\": 1\n}");
    }

    #[test]
    fn test_render_body_plain() {
        let response = ApiResponse::new(200, "openapi: 3.0.3");
        assert_eq!(render_body(&response), "openapi: 3.0.3");
    }
}
