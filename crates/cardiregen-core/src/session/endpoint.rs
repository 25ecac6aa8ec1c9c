//! Endpoint normalization.

/// Path appended to the endpoint for frame submission.
pub const ANALYZE_PATH: &str = "analyze";

/// Trims whitespace and every trailing `/` from a user-supplied base URL.
///
/// Idempotent: normalizing an already normalized endpoint is a no-op.
pub fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.trim().trim_end_matches('/').to_string()
}

/// Joins a normalized endpoint with the analysis path.
pub fn analyze_url(endpoint: &str) -> String {
    format!("{}/{ANALYZE_PATH}", normalize_endpoint(endpoint))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_variants_agree() {
        assert_eq!(analyze_url("https://host/"), "https://host/analyze");
        assert_eq!(analyze_url("https://host"), "https://host/analyze");
        assert_eq!(analyze_url("  https://host//  "), "https://host/analyze");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for raw in ["https://host/", "https://host", "http://x.dev/api///", ""] {
            let once = normalize_endpoint(raw);
            assert_eq!(normalize_endpoint(&once), once);
        }
    }

    #[test]
    fn test_keeps_base_path() {
        assert_eq!(analyze_url("http://localhost:8000/v1/"), "http://localhost:8000/v1/analyze");
    }
}
