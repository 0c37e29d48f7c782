//! Boundary types for the downstream call wrapper.
//!
//! The HTTP/MQ transports themselves live outside this crate; these are the
//! shapes their results arrive in. A successful-but-non-2xx response is not
//! an error here — callers read the status code and record it; only
//! transport faults and timeouts surface as [`DownstreamError`].

use std::collections::HashMap;

use thiserror::Error;

/// Outcome of a successful downstream exchange.
#[derive(Debug, Clone)]
pub struct DownstreamResponse {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub headers: HashMap<String, String>,
    pub host: String,
}

impl DownstreamResponse {
    /// Whether the peer answered with a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// The body as compact text for summary emission.
    pub fn body_text(&self) -> String {
        compact_body(&self.body)
    }
}

/// Failures of the transport itself.
#[derive(Debug, Error)]
pub enum DownstreamError {
    #[error("transport error calling {target}: {reason}")]
    Transport { target: String, reason: String },

    #[error("call to {target} timed out after {timeout_ms} ms")]
    Timeout { target: String, timeout_ms: u64 },
}

/// Compact a response body to a single-line string: JSON bodies are
/// minified, anything else is taken as lossy UTF-8.
pub fn compact_body(body: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => value.to_string(),
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_body_minifies_json() {
        let body = b"{\n  \"status\": \"ok\",\n  \"n\": 1\n}";
        assert_eq!(compact_body(body), "{\"n\":1,\"status\":\"ok\"}");
    }

    #[test]
    fn test_compact_body_passes_plain_text_through() {
        assert_eq!(compact_body(b"upstream said no"), "upstream said no");
    }

    #[test]
    fn test_success_range() {
        let mut response = DownstreamResponse {
            status_code: 204,
            body: Vec::new(),
            headers: HashMap::new(),
            host: "peer".to_string(),
        };
        assert!(response.is_success());
        response.status_code = 404;
        assert!(!response.is_success());
    }
}
