//! Client errors and the backend error envelope

use std::collections::BTreeMap;

use dc_core::{ApiFailure, DcError, ValidationErrors};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Entity name for a 404 reported by the backend; the id slot then
/// carries the backend's message.
pub const REMOTE_RESOURCE: &str = "resource";

/// Failures raised while talking to the backend
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Backend returned {status}")]
    Status { status: u16, body: ErrorBody },

    #[error("Could not decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Response is missing {0}")]
    MissingField(&'static str),
}

impl ApiError {
    pub fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        ApiError::Decode {
            context: context.into(),
            source,
        }
    }
}

/// Every error shape the backend has been seen to send.
///
/// `{status_code, error_code, error_message, error_params: {validation_errors}}`
/// from the structured handlers, and `{error}`, `{message}` or `{detail}`
/// from everything else.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    pub status_code: Option<u16>,
    pub error_code: Option<Value>,
    pub error_message: Option<String>,
    pub message: Option<String>,
    pub detail: Option<Value>,
    pub error: Option<Value>,
    pub error_params: Option<ErrorParams>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ErrorParams {
    pub validation_errors: BTreeMap<String, Value>,
}

impl ErrorBody {
    /// Decode a response body; anything that is not a JSON object becomes
    /// the message itself.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return ErrorBody::default();
        }
        match serde_json::from_str::<ErrorBody>(trimmed) {
            Ok(body) => body,
            Err(_) => ErrorBody {
                message: Some(trimmed.chars().take(500).collect()),
                ..ErrorBody::default()
            },
        }
    }

    /// `error_message`, then `message`, then `detail`, then `error`
    pub fn best_message(&self) -> Option<String> {
        non_blank(self.error_message.as_deref())
            .or_else(|| non_blank(self.message.as_deref()))
            .or_else(|| self.detail.as_ref().and_then(value_text))
            .or_else(|| self.error.as_ref().and_then(value_text))
    }

    pub fn code(&self) -> Option<String> {
        self.error_code.as_ref().and_then(value_text)
    }

    pub fn validation(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        let Some(params) = &self.error_params else {
            return errors;
        };
        for (field, value) in &params.validation_errors {
            match value {
                Value::Array(items) => {
                    for item in items {
                        if let Some(text) = value_text(item) {
                            errors.add(field.clone(), text);
                        }
                    }
                }
                other => {
                    if let Some(text) = value_text(other) {
                        errors.add(field.clone(), text);
                    }
                }
            }
        }
        errors
    }

    pub fn into_failure(self, status: u16) -> ApiFailure {
        ApiFailure {
            status: self.status_code.unwrap_or(status),
            code: self.code(),
            message: self.best_message(),
            validation: self.validation(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => non_blank(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_text).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        Value::Object(map) => map
            .get("msg")
            .or_else(|| map.get("message"))
            .and_then(value_text),
    }
}

impl From<ApiError> for DcError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Request(e) if e.is_decode() => DcError::Decode(e.to_string()),
            ApiError::Request(e) => DcError::Transport(e.to_string()),
            ApiError::Url(e) => DcError::Config(e.to_string()),
            ApiError::Decode { context, source } => {
                DcError::Decode(format!("{context}: {source}"))
            }
            ApiError::MissingField(field) => {
                DcError::Decode(format!("response is missing {field}"))
            }
            ApiError::Status { status, body } => {
                let message = body.best_message();
                match status {
                    401 => DcError::Unauthorized {
                        message: message.unwrap_or_else(|| "Unauthorized".to_string()),
                    },
                    403 => DcError::Forbidden {
                        message: message.unwrap_or_else(|| "Forbidden".to_string()),
                    },
                    404 => DcError::NotFound {
                        entity: REMOTE_RESOURCE,
                        id: message.unwrap_or_default(),
                    },
                    409 => DcError::Conflict {
                        message: message.unwrap_or_else(|| "Conflict".to_string()),
                    },
                    _ => DcError::Api(body.into_failure(status)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_body() {
        let body = ErrorBody::parse(
            r#"{
                "status_code": 400,
                "error_code": "VALIDATION_ERROR",
                "error_message": "Invalid input",
                "error_params": {"validation_errors": {"email": "Invalid email", "name": ["too short", "reserved"]}}
            }"#,
        );
        let failure = body.into_failure(400);
        assert_eq!(failure.code.as_deref(), Some("VALIDATION_ERROR"));
        assert_eq!(failure.message.as_deref(), Some("Invalid input"));
        assert_eq!(failure.validation.get("email").unwrap(), &vec!["Invalid email".to_string()]);
        assert_eq!(failure.validation.get("name").map(Vec::len), Some(2));
    }

    #[test]
    fn test_message_priority() {
        let body = ErrorBody::parse(r#"{"message": "m", "detail": "d", "error": "e"}"#);
        assert_eq!(body.best_message().as_deref(), Some("m"));

        let body = ErrorBody::parse(r#"{"detail": [{"msg": "field required"}], "error": "e"}"#);
        assert_eq!(body.best_message().as_deref(), Some("field required"));

        let body = ErrorBody::parse(r#"{"error": "Project not found"}"#);
        assert_eq!(body.best_message().as_deref(), Some("Project not found"));

        let body = ErrorBody::parse(r#"{"error_message": "  ", "message": "fallback"}"#);
        assert_eq!(body.best_message().as_deref(), Some("fallback"));
    }

    #[test]
    fn test_non_json_body_becomes_message() {
        let body = ErrorBody::parse("<html>Bad Gateway</html>");
        assert_eq!(body.best_message().as_deref(), Some("<html>Bad Gateway</html>"));
        assert_eq!(ErrorBody::parse("").best_message(), None);
    }

    #[test]
    fn test_numeric_error_code() {
        let body = ErrorBody::parse(r#"{"error_code": 1042}"#);
        assert_eq!(body.code().as_deref(), Some("1042"));
    }

    #[test]
    fn test_status_mapping() {
        let status = |status: u16, raw: &str| -> DcError {
            ApiError::Status {
                status,
                body: ErrorBody::parse(raw),
            }
            .into()
        };

        assert!(matches!(
            status(401, r#"{"error": "Token expired"}"#),
            DcError::Unauthorized { message } if message == "Token expired"
        ));
        assert!(matches!(status(403, "{}"), DcError::Forbidden { .. }));
        assert!(matches!(status(404, "{}"), DcError::NotFound { .. }));
        assert!(matches!(status(409, r#"{"message": "exists"}"#), DcError::Conflict { .. }));

        match status(500, r#"{"error_code": "DB", "error_message": "boom"}"#) {
            DcError::Api(failure) => {
                assert_eq!(failure.status, 500);
                assert_eq!(failure.code.as_deref(), Some("DB"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
