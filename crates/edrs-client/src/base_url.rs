//! Backend URL selection.
//!
//! The origin is chosen from, in order:
//! 1. a command-line override (`ApiConfig::url_override`)
//! 2. `EDRS_API_URL`
//! 3. `EDRS_DEV_API_URL` / `EDRS_PROD_API_URL` for the active mode
//! 4. `api.development_url` / `api.production_url`
//!
//! The API base is the origin plus `api.api_path`.

use edrs_config::{ApiConfig, Mode};

use crate::error::ApiError;
use crate::request::Scope;

/// Selects development or production.
pub const MODE_ENV: &str = "EDRS_MODE";
/// Overrides the origin in every mode.
pub const API_URL_ENV: &str = "EDRS_API_URL";
/// Overrides the development origin.
pub const DEV_API_URL_ENV: &str = "EDRS_DEV_API_URL";
/// Overrides the production origin.
pub const PROD_API_URL_ENV: &str = "EDRS_PROD_API_URL";

/// Resolved backend location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl {
    origin: String,
    api: String,
}

impl BaseUrl {
    /// Build from an origin and the API path segment.
    ///
    /// An origin that already ends in `api_path` is accepted and split. An
    /// `api_path` of `/` makes the API base the origin itself.
    #[must_use]
    pub fn new(origin: &str, api_path: &str) -> Self {
        let segment = api_path.trim_matches('/');
        let trimmed = origin.trim_end_matches('/');
        if segment.is_empty() {
            return Self {
                origin: trimmed.to_owned(),
                api: trimmed.to_owned(),
            };
        }

        let api_path = format!("/{segment}");
        let origin = trimmed.strip_suffix(api_path.as_str()).unwrap_or(trimmed);
        Self {
            origin: origin.to_owned(),
            api: format!("{origin}{api_path}"),
        }
    }

    /// Backend origin, e.g. `http://localhost:8000`.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// API base, e.g. `http://localhost:8000/api`.
    #[must_use]
    pub fn api(&self) -> &str {
        &self.api
    }

    /// Join `path` onto the base selected by `scope`.
    #[must_use]
    pub fn join(&self, scope: Scope, path: &str) -> String {
        let base = match scope {
            Scope::Api => &self.api,
            Scope::Origin => &self.origin,
        };
        if path.is_empty() {
            return base.clone();
        }
        format!("{base}/{}", path.trim_start_matches('/'))
    }
}

/// Determine the active mode.
///
/// `EDRS_MODE` wins when it parses; an unparseable value is logged and
/// ignored.
pub fn resolve_mode<F>(api: &ApiConfig, env: F) -> Mode
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(&env, MODE_ENV).map(|v| v.parse::<Mode>()) {
        Some(Ok(mode)) => mode,
        Some(Err(e)) => {
            tracing::warn!("ignoring {MODE_ENV}: {e}");
            api.mode
        }
        None => api.mode,
    }
}

/// Choose the backend URL for `mode`.
///
/// `env` looks up environment variables; pass `|k| std::env::var(k).ok()`
/// in production code. Empty values count as unset.
///
/// # Errors
///
/// Returns [`ApiError::BaseUrl`] when no URL is configured for `mode` or the
/// chosen URL is not http(s).
pub fn resolve_base_url<F>(api: &ApiConfig, mode: Mode, env: F) -> Result<BaseUrl, ApiError>
where
    F: Fn(&str) -> Option<String>,
{
    let mode_var = match mode {
        Mode::Development => DEV_API_URL_ENV,
        Mode::Production => PROD_API_URL_ENV,
    };

    let origin = api
        .url_override
        .clone()
        .or_else(|| non_empty(&env, API_URL_ENV))
        .or_else(|| non_empty(&env, mode_var))
        .or_else(|| api.url_for(mode).map(str::to_owned))
        .ok_or_else(|| {
            ApiError::BaseUrl(format!(
                "no backend URL for {mode} mode; set api.{mode}_url or {mode_var}"
            ))
        })?;

    if !origin.starts_with("http://") && !origin.starts_with("https://") {
        return Err(ApiError::BaseUrl(format!(
            "backend URL must start with http:// or https://: {origin}"
        )));
    }

    Ok(BaseUrl::new(&origin, &api.api_path))
}

fn non_empty<F>(env: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    env(key).filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn api_config() -> ApiConfig {
        ApiConfig {
            production_url: Some("https://edrs.example.com".to_owned()),
            ..ApiConfig::default()
        }
    }

    #[test]
    fn test_development_default() {
        let base = resolve_base_url(&api_config(), Mode::Development, env_from(&[])).unwrap();
        assert_eq!(base.origin(), "http://localhost:8000");
        assert_eq!(base.api(), "http://localhost:8000/api");
    }

    #[test]
    fn test_production_from_config() {
        let base = resolve_base_url(&api_config(), Mode::Production, env_from(&[])).unwrap();
        assert_eq!(base.api(), "https://edrs.example.com/api");
    }

    #[test]
    fn test_production_missing_url() {
        let err =
            resolve_base_url(&ApiConfig::default(), Mode::Production, env_from(&[])).unwrap_err();
        assert!(matches!(err, ApiError::BaseUrl(_)));
        assert!(err.to_string().contains(PROD_API_URL_ENV));
    }

    #[test]
    fn test_mode_specific_env_override() {
        let env = env_from(&[(PROD_API_URL_ENV, "https://prod-env.example.com/")]);
        let base = resolve_base_url(&api_config(), Mode::Production, env).unwrap();
        assert_eq!(base.origin(), "https://prod-env.example.com");
    }

    #[test]
    fn test_other_mode_env_ignored() {
        let env = env_from(&[(PROD_API_URL_ENV, "https://prod-env.example.com")]);
        let base = resolve_base_url(&api_config(), Mode::Development, env).unwrap();
        assert_eq!(base.origin(), "http://localhost:8000");
    }

    #[test]
    fn test_global_env_beats_mode_env() {
        let env = env_from(&[
            (API_URL_ENV, "https://global.example.com"),
            (DEV_API_URL_ENV, "http://dev-env:8000"),
        ]);
        let base = resolve_base_url(&api_config(), Mode::Development, env).unwrap();
        assert_eq!(base.origin(), "https://global.example.com");
    }

    #[test]
    fn test_cli_override_beats_env() {
        let api = ApiConfig {
            url_override: Some("https://cli.example.com".to_owned()),
            ..api_config()
        };
        let env = env_from(&[(API_URL_ENV, "https://global.example.com")]);
        let base = resolve_base_url(&api, Mode::Production, env).unwrap();
        assert_eq!(base.origin(), "https://cli.example.com");
    }

    #[test]
    fn test_empty_env_counts_as_unset() {
        let env = env_from(&[(API_URL_ENV, "  ")]);
        let base = resolve_base_url(&api_config(), Mode::Development, env).unwrap();
        assert_eq!(base.origin(), "http://localhost:8000");
    }

    #[test]
    fn test_rejects_non_http() {
        let env = env_from(&[(API_URL_ENV, "localhost:8000")]);
        assert!(resolve_base_url(&api_config(), Mode::Development, env).is_err());
    }

    #[test]
    fn test_origin_with_api_suffix_is_split() {
        let base = BaseUrl::new("https://edrs.example.com/api/", "/api");
        assert_eq!(base.origin(), "https://edrs.example.com");
        assert_eq!(base.api(), "https://edrs.example.com/api");
    }

    #[test]
    fn test_join() {
        let base = BaseUrl::new("http://localhost:8000", "/api");
        assert_eq!(
            base.join(Scope::Api, "/core/categories/"),
            "http://localhost:8000/api/core/categories/"
        );
        assert_eq!(
            base.join(Scope::Api, "schema/"),
            "http://localhost:8000/api/schema/"
        );
        assert_eq!(
            base.join(Scope::Origin, "/health/"),
            "http://localhost:8000/health/"
        );
    }

    #[test]
    fn test_root_api_path_uses_origin() {
        let base = BaseUrl::new("http://localhost:8000/", "/");
        assert_eq!(base.api(), "http://localhost:8000");
        assert_eq!(
            base.join(Scope::Api, "/core/categories/"),
            "http://localhost:8000/core/categories/"
        );
    }

    #[test]
    fn test_resolve_mode_env_wins() {
        let env = env_from(&[(MODE_ENV, "production")]);
        assert_eq!(resolve_mode(&ApiConfig::default(), env), Mode::Production);
    }

    #[test]
    fn test_resolve_mode_invalid_env_falls_back() {
        let env = env_from(&[(MODE_ENV, "staging")]);
        assert_eq!(resolve_mode(&ApiConfig::default(), env), Mode::Development);
    }
}
