//! Turning errors into the message a user sees

use dc_client::REMOTE_RESOURCE;
use dc_core::DcError;

/// Render `err` for display, using `fallback` when the error carries no
/// usable message of its own.
///
/// The backend message wins over a transport message, which wins over the
/// fallback. Field validation messages, the backend error code and the
/// response status are appended when present:
/// `Invalid input: email Invalid email (Code: VALIDATION_ERROR) [Status: 400]`.
pub fn describe_error(err: &DcError, fallback: &str) -> String {
    let mut code = None;
    let mut details = Vec::new();

    let mut message = match err {
        DcError::Api(failure) => {
            code = failure.code.clone();
            details = failure.validation.full_messages();
            failure.message.clone().unwrap_or_else(|| fallback.to_string())
        }
        DcError::Unauthorized { message }
        | DcError::Forbidden { message }
        | DcError::Conflict { message } => message.clone(),
        DcError::NotFound { entity, id } if *entity == REMOTE_RESOURCE && !id.is_empty() => {
            id.clone()
        }
        DcError::Transport(message) => message.clone(),
        DcError::Validation(errors) => {
            if errors.is_empty() {
                fallback.to_string()
            } else {
                errors.full_messages().join("; ")
            }
        }
        _ => fallback.to_string(),
    };

    if !details.is_empty() {
        message.push_str(": ");
        message.push_str(&details.join("; "));
    }
    if let Some(code) = code {
        message.push_str(&format!(" (Code: {code})"));
    }
    if let Some(status) = err.response_status() {
        message.push_str(&format!(" [Status: {status}]"));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_core::{ApiFailure, ValidationErrors};

    #[test]
    fn test_backend_message_with_code_and_status() {
        let err = DcError::Api(
            ApiFailure::new(400)
                .with_code("PROJECT_EXISTS")
                .with_message("Project already exists"),
        );
        assert_eq!(
            describe_error(&err, "Failed to create project"),
            "Project already exists (Code: PROJECT_EXISTS) [Status: 400]"
        );
    }

    #[test]
    fn test_fallback_when_body_is_silent() {
        let err = DcError::Api(ApiFailure::new(500));
        assert_eq!(
            describe_error(&err, "Failed to load projects"),
            "Failed to load projects [Status: 500]"
        );
    }

    #[test]
    fn test_validation_details_are_appended() {
        let mut validation = ValidationErrors::new();
        validation.add("email", "Invalid email");
        let err = DcError::Api(ApiFailure {
            status: 422,
            code: Some("VALIDATION_ERROR".into()),
            message: Some("Invalid input".into()),
            validation,
        });
        assert_eq!(
            describe_error(&err, "x"),
            "Invalid input: email Invalid email (Code: VALIDATION_ERROR) [Status: 422]"
        );
    }

    #[test]
    fn test_transport_message_has_no_status() {
        let err = DcError::Transport("connection refused".into());
        assert_eq!(describe_error(&err, "Failed to log in"), "connection refused");
    }

    #[test]
    fn test_typed_statuses() {
        let err = DcError::Unauthorized {
            message: "Invalid email or password".into(),
        };
        assert_eq!(
            describe_error(&err, "Failed to log in"),
            "Invalid email or password [Status: 401]"
        );

        let remote = DcError::NotFound {
            entity: REMOTE_RESOURCE,
            id: "Project not found".into(),
        };
        assert_eq!(describe_error(&remote, "x"), "Project not found [Status: 404]");

        let local = DcError::not_found("project", "p-9");
        assert_eq!(
            describe_error(&local, "Failed to load project"),
            "Failed to load project [Status: 404]"
        );
    }

    #[test]
    fn test_local_validation() {
        let mut errors = ValidationErrors::new();
        errors.add_base("Please select a municipality.");
        let err = DcError::Validation(errors);
        assert_eq!(describe_error(&err, "x"), "Please select a municipality.");

        let decode = DcError::Decode("bad json".into());
        assert_eq!(describe_error(&decode, "Failed to load data"), "Failed to load data");
    }
}
