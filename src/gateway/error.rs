//! Failure normalization
//!
//! The resource API reports failures in several body shapes. They are parsed
//! into [`ErrorPayload`] and reduced to one [`ApiError`] descriptor, so no
//! caller ever inspects a raw transport failure.

use serde_json::Value;
use thiserror::Error;

/// Fallback message when nothing better can be extracted
pub const DEFAULT_FALLBACK: &str = "Something went wrong";

/// Known shapes of a failure body
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorPayload {
    /// Body is a bare string
    Text(String),
    /// `{"detail": "..."}`
    Detail(String),
    /// `{"detail": <structured>}` (validation error lists and the like)
    DetailValue(Value),
    /// `{"message": "..."}`
    Message(String),
    /// Anything else
    Other(Value),
}

impl ErrorPayload {
    /// Classify a decoded failure body
    pub fn from_value(value: &Value) -> Self {
        if let Value::String(text) = value {
            return ErrorPayload::Text(text.clone());
        }

        if let Some(detail) = value.get("detail").filter(|d| is_truthy(d)) {
            return match detail {
                Value::String(text) => ErrorPayload::Detail(text.clone()),
                other => ErrorPayload::DetailValue(other.clone()),
            };
        }

        match value.get("message") {
            Some(Value::String(text)) if !text.is_empty() => ErrorPayload::Message(text.clone()),
            _ => ErrorPayload::Other(value.clone()),
        }
    }

    /// Classify a raw response body; non-JSON bodies are treated as text
    pub fn from_body(body: &str) -> Option<Self> {
        if body.trim().is_empty() {
            return None;
        }
        let payload = match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_value(&value),
            Err(_) => ErrorPayload::Text(body.to_string()),
        };
        Some(payload)
    }

    /// The user-facing message carried by this payload, if any
    pub fn message(&self) -> Option<String> {
        match self {
            ErrorPayload::Text(text) if !text.is_empty() => Some(text.clone()),
            ErrorPayload::Detail(text) | ErrorPayload::Message(text) => Some(text.clone()),
            ErrorPayload::DetailValue(value) => serde_json::to_string(value).ok(),
            ErrorPayload::Text(_) | ErrorPayload::Other(_) => None,
        }
    }
}

/// JSON truthiness: null, false, 0 and "" carry no detail
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Uniform error descriptor for every failed resource API call
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ApiError {
    status_code: Option<u16>,
    message: String,
    raw: Option<Value>,
}

impl ApiError {
    pub fn new(status_code: Option<u16>, message: impl Into<String>, raw: Option<Value>) -> Self {
        Self {
            status_code,
            message: message.into(),
            raw,
        }
    }

    /// Build the descriptor from whatever the failure provided
    ///
    /// Extraction order: payload message, then the transport-level message,
    /// then `fallback`.
    pub fn normalize(
        status_code: Option<u16>,
        body: Option<&str>,
        transport_message: Option<&str>,
        fallback: &str,
    ) -> Self {
        let payload = body.and_then(ErrorPayload::from_body);
        let raw = body.filter(|b| !b.trim().is_empty()).map(|b| {
            serde_json::from_str::<Value>(b).unwrap_or_else(|_| Value::String(b.to_string()))
        });

        let message = payload
            .as_ref()
            .and_then(ErrorPayload::message)
            .or_else(|| {
                transport_message
                    .filter(|m| !m.trim().is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| fallback.to_string());

        Self {
            status_code,
            message,
            raw,
        }
    }

    /// Non-success HTTP status
    pub fn from_status(status: u16, body: &str, fallback: &str) -> Self {
        let transport_message = format!("Request failed with status code {}", status);
        Self::normalize(Some(status), Some(body), Some(&transport_message), fallback)
    }

    /// The request never produced a response
    pub fn from_transport(message: &str, fallback: &str) -> Self {
        Self::normalize(None, None, Some(message), fallback)
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn raw(&self) -> Option<&Value> {
        self.raw.as_ref()
    }

    /// The credential was missing, invalid or expired
    pub fn is_unauthorized(&self) -> bool {
        self.status_code == Some(401)
    }

    /// No HTTP response was received
    pub fn is_transport(&self) -> bool {
        self.status_code.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_shapes() {
        assert_eq!(
            ErrorPayload::from_value(&json!("plain")),
            ErrorPayload::Text("plain".to_string())
        );
        assert_eq!(
            ErrorPayload::from_value(&json!({"detail": "Agent not found"})),
            ErrorPayload::Detail("Agent not found".to_string())
        );
        assert!(matches!(
            ErrorPayload::from_value(&json!({"detail": [{"loc": ["body", "email"]}]})),
            ErrorPayload::DetailValue(_)
        ));
        assert_eq!(
            ErrorPayload::from_value(&json!({"message": "nope"})),
            ErrorPayload::Message("nope".to_string())
        );
        assert!(matches!(
            ErrorPayload::from_value(&json!({"error": "x"})),
            ErrorPayload::Other(_)
        ));
    }

    #[test]
    fn test_empty_detail_falls_through_to_message() {
        let payload = ErrorPayload::from_value(&json!({"detail": "", "message": "from message"}));
        assert_eq!(payload, ErrorPayload::Message("from message".to_string()));
    }

    #[test]
    fn test_detail_string_wins() {
        let err = ApiError::from_status(
            401,
            r#"{"detail": "Invalid email or password", "message": "ignored"}"#,
            "Login failed",
        );
        assert_eq!(err.message(), "Invalid email or password");
        assert_eq!(err.status_code(), Some(401));
        assert!(err.is_unauthorized());
        assert!(err.raw().is_some());
    }

    #[test]
    fn test_structured_detail_is_serialized() {
        let err = ApiError::from_status(422, r#"{"detail": [{"msg": "field required"}]}"#, "x");
        assert_eq!(err.message(), r#"[{"msg":"field required"}]"#);
    }

    #[test]
    fn test_text_body() {
        let err = ApiError::from_status(502, "Bad Gateway", "x");
        assert_eq!(err.message(), "Bad Gateway");
        assert_eq!(err.raw(), Some(&Value::String("Bad Gateway".to_string())));
    }

    #[test]
    fn test_unrecognized_body_uses_status_message() {
        let err = ApiError::from_status(500, r#"{"error": "boom"}"#, "x");
        assert_eq!(err.message(), "Request failed with status code 500");
    }

    #[test]
    fn test_empty_body_uses_status_message() {
        let err = ApiError::from_status(404, "", "x");
        assert_eq!(err.message(), "Request failed with status code 404");
        assert!(err.raw().is_none());
    }

    #[test]
    fn test_transport_failure() {
        let err = ApiError::from_transport("connection refused", DEFAULT_FALLBACK);
        assert_eq!(err.message(), "connection refused");
        assert!(err.is_transport());
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_fallback_when_nothing_else() {
        let err = ApiError::normalize(None, None, Some("  "), "Failed to create reminder");
        assert_eq!(err.message(), "Failed to create reminder");
        assert_eq!(err.to_string(), "Failed to create reminder");
    }
}
