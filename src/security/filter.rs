//! Request metadata heuristics: user agent, header names, declared size.
//!
//! All checks are pure and look only at request metadata, never the body.

use axum::http::HeaderMap;

use crate::config::FilterConfig;

#[derive(Debug, Clone)]
pub struct RequestFilter {
    /// Lowercased.
    blocked_agents: Vec<String>,
    /// Lowercased.
    forbidden_headers: Vec<String>,
    max_content_length: u64,
}

impl RequestFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            blocked_agents: config
                .blocked_user_agents
                .iter()
                .map(|ua| ua.to_lowercase())
                .collect(),
            forbidden_headers: config
                .forbidden_headers
                .iter()
                .map(|h| h.to_lowercase())
                .collect(),
            max_content_length: config.max_content_length,
        }
    }

    /// An absent or empty user agent passes. Otherwise fails if it contains
    /// any denylisted tool fingerprint.
    pub fn check_user_agent(&self, user_agent: Option<&str>) -> bool {
        let Some(ua) = user_agent.filter(|ua| !ua.is_empty()) else {
            return true;
        };
        let ua = ua.to_lowercase();
        !self
            .blocked_agents
            .iter()
            .any(|needle| ua.contains(needle.as_str()))
    }

    /// Fails if any forbidden header name is present, whatever its value.
    pub fn check_headers(&self, headers: &HeaderMap) -> bool {
        // HeaderName is always lowercase.
        !headers
            .keys()
            .any(|name| self.forbidden_headers.iter().any(|f| f == name.as_str()))
    }

    /// Absent passes. Present must parse as a non-negative integer no larger
    /// than the limit.
    pub fn check_declared_size(&self, content_length: Option<&str>) -> bool {
        match content_length {
            None => true,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(declared) => declared <= self.max_content_length,
                Err(_) => false,
            },
        }
    }
}

impl Default for RequestFilter {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_missing_or_empty_agent_allowed() {
        let filter = RequestFilter::default();
        assert!(filter.check_user_agent(None));
        assert!(filter.check_user_agent(Some("")));
    }

    #[test]
    fn test_scanner_agents_rejected() {
        let filter = RequestFilter::default();
        assert!(!filter.check_user_agent(Some("sqlmap/1.0")));
        assert!(!filter.check_user_agent(Some("Mozilla/5.0 (compatible; Nmap Scripting Engine)")));
        assert!(!filter.check_user_agent(Some("curl/8.4.0")));
        assert!(!filter.check_user_agent(Some("Wget/1.21")));
        assert!(filter.check_user_agent(Some("Mozilla/5.0 (X11; Linux x86_64)")));
        assert!(filter.check_user_agent(Some("auv-cli/0.1")));
    }

    #[test]
    fn test_forbidden_headers() {
        let filter = RequestFilter::default();
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("application/json"));
        assert!(filter.check_headers(&headers));

        headers.insert("X-Forwarded-For", HeaderValue::from_static("1.2.3.4"));
        assert!(!filter.check_headers(&headers));

        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static(""));
        assert!(!filter.check_headers(&headers));
    }

    #[test]
    fn test_configured_header_names_case_insensitive() {
        let filter = RequestFilter::new(&FilterConfig {
            forbidden_headers: vec!["X-Debug-Token".into()],
            ..FilterConfig::default()
        });
        let mut headers = HeaderMap::new();
        headers.insert("x-debug-token", HeaderValue::from_static("1"));
        assert!(!filter.check_headers(&headers));
    }

    #[test]
    fn test_declared_size() {
        let filter = RequestFilter::default();
        assert!(filter.check_declared_size(None));
        assert!(filter.check_declared_size(Some("0")));
        assert!(filter.check_declared_size(Some("10240")));
        assert!(!filter.check_declared_size(Some("10241")));
        assert!(!filter.check_declared_size(Some("20000")));
        assert!(!filter.check_declared_size(Some("-1")));
        assert!(!filter.check_declared_size(Some("lots")));
    }
}
