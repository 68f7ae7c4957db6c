//! Core error types for DocConstruct RS
//!
//! One taxonomy for every flow: transport failures, client-side validation
//! failures, and structured errors reported by the backend.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Core error type for all DocConstruct operations
#[derive(Error, Debug)]
pub enum DcError {
    #[error("Not found: {entity} with id={id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Contract violation: {0}")]
    Contract(#[from] ContractError),

    #[error("{0}")]
    Api(ApiFailure),

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Structured failure reported by the backend.
///
/// The backend speaks two envelopes, `{error_code, error_message}` and
/// `{error_params: {validation_errors}}`, plus the occasional bare
/// `message`, `detail` or `error` string. All of them land here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiFailure {
    pub status: u16,
    pub code: Option<String>,
    pub message: Option<String>,
    pub validation: ValidationErrors,
}

impl ApiFailure {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API error {}", self.status)?;
        if let Some(code) = &self.code {
            write!(f, " ({})", code)?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

/// Validation errors collection
///
/// Field order is deterministic so that messages render identically on
/// every run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    /// Messages keyed by field name
    pub errors: BTreeMap<String, Vec<String>>,
    /// Messages about the record as a whole
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    /// Whether `field` has at least one message
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Messages recorded for `field`
    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
    }

    /// The message a form shows first: base errors win over field errors.
    pub fn first_message(&self) -> Option<String> {
        self.full_messages().into_iter().next()
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        for (field, field_messages) in &self.errors {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }

    /// `Ok(())` when empty, the collection itself otherwise
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_messages().join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Contract validation error
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Attribute {attribute} is invalid: {message}")]
    AttributeInvalid { attribute: String, message: String },

    #[error("Attribute {attribute} is not writable")]
    AttributeNotWritable { attribute: String },

    #[error("Base contract error: {message}")]
    Base { message: String },
}

impl From<ContractError> for ValidationErrors {
    fn from(err: ContractError) -> Self {
        let mut errors = ValidationErrors::new();
        match err {
            ContractError::AttributeInvalid { attribute, message } => {
                errors.add(attribute, message);
            }
            ContractError::AttributeNotWritable { attribute } => {
                errors.add(attribute, "is not writable");
            }
            ContractError::Base { message } => {
                errors.add_base(message);
            }
        }
        errors
    }
}

/// Status and code as the backend would report them
impl DcError {
    pub fn status_code(&self) -> u16 {
        match self {
            DcError::NotFound { .. } => 404,
            DcError::Unauthorized { .. } => 401,
            DcError::Forbidden { .. } => 403,
            DcError::Validation(_) | DcError::Contract(_) => 422,
            DcError::Api(failure) => failure.status,
            DcError::Conflict { .. } => 409,
            DcError::Transport(_) => 503,
            DcError::Decode(_) => 502,
            DcError::Io(_) | DcError::Config(_) | DcError::Internal(_) => 500,
        }
    }

    pub fn error_code(&self) -> &str {
        match self {
            DcError::NotFound { .. } => "not_found",
            DcError::Unauthorized { .. } => "unauthorized",
            DcError::Forbidden { .. } => "forbidden",
            DcError::Validation(_) => "validation_failed",
            DcError::Contract(_) => "contract_violated",
            DcError::Api(failure) => failure.code.as_deref().unwrap_or("api_error"),
            DcError::Conflict { .. } => "conflict",
            DcError::Transport(_) => "transport_error",
            DcError::Decode(_) => "decode_error",
            DcError::Io(_) => "io_error",
            DcError::Config(_) => "configuration_error",
            DcError::Internal(_) => "internal_error",
        }
    }

    /// Status of the HTTP response this error came from, if any.
    ///
    /// Failures raised before a response arrived report `None`.
    pub fn response_status(&self) -> Option<u16> {
        match self {
            DcError::NotFound { .. }
            | DcError::Unauthorized { .. }
            | DcError::Forbidden { .. }
            | DcError::Api(_)
            | DcError::Conflict { .. } => Some(self.status_code()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, DcError::Unauthorized { .. })
            || matches!(self, DcError::Api(failure) if failure.status == 401)
    }

    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        DcError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_messages_are_ordered() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "can't be blank");
        errors.add("address", "can't be blank");
        errors.add_base("Please fill in all required fields.");

        assert_eq!(
            errors.full_messages(),
            vec![
                "Please fill in all required fields.".to_string(),
                "address can't be blank".to_string(),
                "name can't be blank".to_string(),
            ]
        );
        assert_eq!(
            errors.first_message().as_deref(),
            Some("Please fill in all required fields.")
        );
    }

    #[test]
    fn test_merge_and_into_result() {
        let mut errors = ValidationErrors::new();
        assert!(errors.clone().into_result().is_ok());

        let mut other = ValidationErrors::new();
        other.add("email", "is invalid");
        errors.merge(other);

        assert!(errors.has_error("email"));
        assert_eq!(errors.get("email").map(Vec::len), Some(1));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_contract_error_conversion() {
        let errors: ValidationErrors = ContractError::AttributeNotWritable {
            attribute: "documents".into(),
        }
        .into();
        assert_eq!(errors.full_messages(), vec!["documents is not writable"]);
    }

    #[test]
    fn test_status_and_codes() {
        let api = DcError::Api(ApiFailure::new(500).with_code("E42"));
        assert_eq!(api.status_code(), 500);
        assert_eq!(api.error_code(), "E42");
        assert_eq!(api.response_status(), Some(500));

        let local = DcError::Validation(ValidationErrors::new());
        assert_eq!(local.response_status(), None);

        assert!(DcError::Unauthorized { message: "x".into() }.is_unauthorized());
        assert!(DcError::Api(ApiFailure::new(401)).is_unauthorized());
        assert_eq!(DcError::not_found("project", 7).to_string(), "Not found: project with id=7");
    }
}
