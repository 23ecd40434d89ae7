//! Request augmentation.
//!
//! Adds the headers every backend call carries: JSON content negotiation,
//! the session's bearer token and a request identifier for log correlation.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngExt;

use crate::request::RequestContext;

/// Header carrying the request identifier.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Length of the random part of a request ID.
const SUFFIX_LEN: usize = 9;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Attach standard headers and a fresh request ID to `ctx`.
///
/// `Authorization` is set to `Bearer <token>` when `token` is present and
/// removed otherwise, so the request never carries more than one.
pub fn augment(ctx: &mut RequestContext, token: Option<&str>) {
    ctx.headers.set("Content-Type", "application/json");
    ctx.headers.set("Accept", "application/json");

    match token {
        Some(token) => ctx.headers.set("Authorization", format!("Bearer {token}")),
        None => ctx.headers.remove("Authorization"),
    }

    ctx.request_id = new_request_id();
    ctx.headers.set(REQUEST_ID_HEADER, ctx.request_id.clone());
}

/// Generate `<unix-millis>-<9 base36 chars>`.
///
/// Unique enough to correlate logs; not suitable as a security token.
#[must_use]
pub fn new_request_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());

    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
        .collect();

    format!("{millis}-{suffix}")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::request::{ApiRequest, Method};

    fn context() -> RequestContext {
        RequestContext::new(
            ApiRequest::new(Method::Get, "/core/categories/"),
            "http://localhost:8000/api/core/categories/".to_owned(),
            3,
        )
    }

    #[test]
    fn test_augment_with_token() {
        let mut ctx = context();
        augment(&mut ctx, Some("abc123"));

        assert_eq!(ctx.headers.count("Authorization"), 1);
        assert_eq!(ctx.headers.get("Authorization"), Some("Bearer abc123"));
        assert_eq!(ctx.headers.get("Content-Type"), Some("application/json"));
        assert_eq!(ctx.headers.get("Accept"), Some("application/json"));
    }

    #[test]
    fn test_augment_without_token() {
        let mut ctx = context();
        augment(&mut ctx, None);

        assert_eq!(ctx.headers.count("Authorization"), 0);
    }

    #[test]
    fn test_augment_replaces_caller_authorization() {
        let mut ctx = RequestContext::new(
            ApiRequest::get("/core/categories/").header("authorization", "Basic Zm9vOmJhcg=="),
            "http://localhost:8000/api/core/categories/".to_owned(),
            3,
        );
        augment(&mut ctx, Some("abc123"));

        assert_eq!(ctx.headers.count("Authorization"), 1);
        assert_eq!(ctx.headers.get("Authorization"), Some("Bearer abc123"));
    }

    #[test]
    fn test_augment_strips_authorization_when_logged_out() {
        let mut ctx = RequestContext::new(
            ApiRequest::get("/core/categories/").header("Authorization", "Bearer stale"),
            "http://localhost:8000/api/core/categories/".to_owned(),
            3,
        );
        augment(&mut ctx, None);

        assert_eq!(ctx.headers.count("Authorization"), 0);
    }

    #[test]
    fn test_augment_sets_request_id_header() {
        let mut ctx = context();
        augment(&mut ctx, None);

        assert!(!ctx.request_id.is_empty());
        assert_eq!(
            ctx.headers.get(REQUEST_ID_HEADER),
            Some(ctx.request_id.as_str())
        );
        assert_eq!(ctx.headers.count(REQUEST_ID_HEADER), 1);
    }

    #[test]
    fn test_request_id_format() {
        let id = new_request_id();
        let (millis, suffix) = id.split_once('-').unwrap();

        assert!(millis.parse::<u128>().is_ok());
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }

    #[test]
    fn test_request_ids_differ() {
        assert_ne!(new_request_id(), new_request_id());
    }
}
