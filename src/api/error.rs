use serde::Deserialize;

use super::Endpoint;

/// Single error shape for every backend round trip.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The backend could not be reached at all.
    #[error(
        "Cannot connect to backend server at {base}. \
         Make sure the prediction backend is running."
    )]
    Connection { base: String },
    /// Non-2xx response; `message` is the backend's own text when it sent one.
    #[error("{message}")]
    Api { status: u16, message: String },
    /// 2xx response whose body does not match the expected schema.
    #[error("Malformed {endpoint} response: {reason}")]
    Schema { endpoint: String, reason: String },
    #[error("{0}")]
    Unexpected(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiError {
    /// Backend message verbatim, falling back to a generic status line.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error.or(b.message))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Request failed with status code {}", status));
        ApiError::Api { status, message }
    }

    pub fn schema(endpoint: Endpoint, reason: impl Into<String>) -> Self {
        ApiError::Schema {
            endpoint: endpoint.path().to_string(),
            reason: reason.into(),
        }
    }

    /// Transport-level failure: unreachable backends become `Connection`,
    /// everything else keeps its own text or the endpoint's fallback.
    pub fn from_transport(endpoint: Endpoint, base: &str, err: &reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            return ApiError::Connection { base: base.to_string() };
        }
        if err.is_decode() {
            return ApiError::schema(endpoint, err.to_string());
        }
        let text = err.to_string();
        if text.trim().is_empty() {
            ApiError::Unexpected(endpoint.fallback_message().to_string())
        } else {
            ApiError::Unexpected(text)
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, ApiError::Connection { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_field_surfaces_verbatim() {
        let body = br#"{"error": "Models not loaded. Please run python train_models.py first."}"#;
        let err = ApiError::from_status(503, body);
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "Models not loaded. Please run python train_models.py first.");
    }

    #[test]
    fn message_field_is_second_choice() {
        let body = br#"{"status": "error", "message": "Models not loaded"}"#;
        let err = ApiError::from_status(503, body);
        assert_eq!(err.to_string(), "Models not loaded");
    }

    #[test]
    fn non_json_body_gets_generic_fallback() {
        let err = ApiError::from_status(502, b"<html>Bad Gateway</html>");
        assert_eq!(err.to_string(), "Request failed with status code 502");
        let empty = ApiError::from_status(500, br#"{"error": "  "}"#);
        assert_eq!(empty.to_string(), "Request failed with status code 500");
    }

    #[test]
    fn connection_message_names_the_backend() {
        let err = ApiError::Connection { base: "http://127.0.0.1:5001/api/".into() };
        assert!(err.is_connection());
        assert!(err.to_string().contains("http://127.0.0.1:5001/api/"));
    }

    #[test]
    fn schema_error_names_endpoint() {
        let err = ApiError::schema(Endpoint::Dataset, "2 rows but 3 target labels");
        assert_eq!(err.to_string(), "Malformed dataset response: 2 rows but 3 target labels");
    }
}
