//! Helper functions for middleware

use actix_web::http::header::HeaderMap;

/// Extract the bearer credential from the Authorization header
///
/// Returns None when the header is absent, unreadable, or not a bearer
/// scheme; the pipeline treats all of those as a missing credential.
pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;
    auth_str
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

/// Check if a route is public (doesn't require admission)
pub fn is_public_route(path: &str) -> bool {
    const PUBLIC_ROUTES: &[&str] = &["/health", "/metrics"];

    PUBLIC_ROUTES.iter().any(|&route| path.starts_with(route))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};

    fn headers_with_auth(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("authorization"),
            HeaderValue::from_static(value),
        );
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        let headers = headers_with_auth("Bearer abc.def.ghi");
        assert_eq!(extract_bearer(&headers), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_extract_bearer_missing_header() {
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
    }

    #[test]
    fn test_extract_bearer_wrong_scheme() {
        let headers = headers_with_auth("Basic dXNlcjpwYXNz");
        assert_eq!(extract_bearer(&headers), None);
    }

    #[test]
    fn test_extract_bearer_requires_exact_prefix() {
        let headers = headers_with_auth("bearer abc.def.ghi");
        assert_eq!(extract_bearer(&headers), None);
    }

    #[test]
    fn test_public_routes() {
        assert!(is_public_route("/health"));
        assert!(is_public_route("/metrics"));
        assert!(!is_public_route("/api/resource"));
        assert!(!is_public_route("/"));
    }
}
