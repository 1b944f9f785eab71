use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A captured request or response payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Body {
    Json(serde_json::Value),
    Text(String),
}

impl Body {
    /// Decodes raw bytes. JSON is tried first when the content type says so (or
    /// when no content type is known); anything else is kept as text. Bytes that
    /// are not UTF-8 yield `None`.
    pub fn from_bytes(bytes: &[u8], content_type: Option<&str>) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        let text = std::str::from_utf8(bytes).ok()?;
        let looks_json = content_type.map_or(true, |ct| ct.contains("json"));
        if looks_json {
            if let Ok(value) = serde_json::from_str(text) {
                return Some(Body::Json(value));
            }
        }
        Some(Body::Text(text.to_string()))
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Json(value) => match serde_json::to_string_pretty(value) {
                Ok(pretty) => f.write_str(&pretty),
                Err(_) => write!(f, "{value}"),
            },
            Body::Text(text) => f.write_str(text),
        }
    }
}

/// One intercepted HTTP exchange.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiCallRecord {
    pub id: u64,
    pub method: String,
    pub url: String,
    pub request_body: Option<Body>,
    /// `None` when the call never produced an HTTP status (network failure).
    pub status_code: Option<u16>,
    pub error: Option<String>,
    pub response_body: Option<Body>,
    pub content_type: Option<String>,
    pub response_size: Option<usize>,
    /// Dispatch time.
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ApiCallRecord {
    pub fn status_label(&self) -> String {
        match self.status_code {
            Some(code) => code.to_string(),
            None => "ERR".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status_code, Some(code) if (200..300).contains(&code))
    }
}

impl fmt::Display for ApiCallRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}ms", self.method, self.url, self.status_label(), self.duration_ms)
    }
}

#[derive(Clone)]
pub struct DeploymentOption {
    pub name: String,
    pub namespace: String,
}

impl fmt::Display for DeploymentOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_body_is_parsed_when_declared() {
        let body = Body::from_bytes(br#"{"ok":true}"#, Some("application/json; charset=utf-8"));
        assert_eq!(body, Some(Body::Json(serde_json::json!({"ok": true}))));
    }

    #[test]
    fn malformed_json_falls_back_to_text() {
        let body = Body::from_bytes(b"{not json", Some("application/json"));
        assert_eq!(body, Some(Body::Text("{not json".into())));
    }

    #[test]
    fn plain_text_is_not_parsed_as_json() {
        let body = Body::from_bytes(b"42", Some("text/plain"));
        assert_eq!(body, Some(Body::Text("42".into())));
    }

    #[test]
    fn binary_and_empty_bodies_are_omitted() {
        assert_eq!(Body::from_bytes(&[0xff, 0xfe, 0x00], None), None);
        assert_eq!(Body::from_bytes(b"", Some("application/json")), None);
    }

    #[test]
    fn record_summary_uses_sentinel_for_network_failures() {
        let record = ApiCallRecord {
            id: 1,
            method: "GET".into(),
            url: "/api/nodes".into(),
            request_body: None,
            status_code: None,
            error: Some("connection refused".into()),
            response_body: None,
            content_type: None,
            response_size: None,
            timestamp: Utc::now(),
            duration_ms: 12,
        };
        assert_eq!(record.to_string(), "GET /api/nodes ERR 12ms");
        assert!(!record.is_success());
    }
}
