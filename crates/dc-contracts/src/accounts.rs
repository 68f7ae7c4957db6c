//! Account contracts: password change and admin user creation

use dc_core::error::ValidationErrors;
use dc_models::{NewUser, PasswordChange};

use crate::base::{is_blank, is_valid_email, require, Contract, ValidationResult};

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub const ALL_FIELDS_REQUIRED: &str = "All fields are required";
pub const PASSWORD_MISMATCH: &str = "New password and confirm password do not match";
pub const PASSWORD_TOO_SHORT: &str = "New password must be at least 8 characters long";

/// Stops at the first failing rule, like the form it backs.
#[derive(Debug, Default, Clone, Copy)]
pub struct PasswordChangeContract;

impl PasswordChangeContract {
    pub fn new() -> Self {
        Self
    }
}

impl Contract<PasswordChange> for PasswordChangeContract {
    fn validate(&self, entity: &PasswordChange) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if entity.current_password.is_empty()
            || entity.new_password.is_empty()
            || entity.confirm_password.is_empty()
        {
            errors.add_base(ALL_FIELDS_REQUIRED);
        } else if entity.new_password != entity.confirm_password {
            errors.add_base(PASSWORD_MISMATCH);
        } else if entity.new_password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add_base(PASSWORD_TOO_SHORT);
        }

        errors.into_result()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NewUserContract;

impl NewUserContract {
    pub fn new() -> Self {
        Self
    }
}

impl Contract<NewUser> for NewUserContract {
    fn validate(&self, entity: &NewUser) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if require(&mut errors, "email", &entity.email) && !is_valid_email(&entity.email) {
            errors.add("email", "is not a valid email address");
        }
        if is_blank(&entity.password) {
            errors.add("password", "can't be blank");
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(current: &str, new: &str, confirm: &str) -> PasswordChange {
        PasswordChange {
            current_password: current.into(),
            new_password: new.into(),
            confirm_password: confirm.into(),
        }
    }

    fn first(result: ValidationResult) -> Option<String> {
        result.err().and_then(|e| e.first_message())
    }

    #[test]
    fn test_password_change_rules_in_order() {
        let contract = PasswordChangeContract::new();
        assert_eq!(first(contract.validate(&change("", "x", "x"))).as_deref(), Some(ALL_FIELDS_REQUIRED));
        assert_eq!(
            first(contract.validate(&change("old", "short", "other"))).as_deref(),
            Some(PASSWORD_MISMATCH)
        );
        assert_eq!(
            first(contract.validate(&change("old", "short", "short"))).as_deref(),
            Some(PASSWORD_TOO_SHORT)
        );
        assert!(contract.validate(&change("old", "long enough", "long enough")).is_ok());
    }

    #[test]
    fn test_new_user() {
        let contract = NewUserContract::new();
        let errors = contract.validate(&NewUser::default()).unwrap_err();
        assert!(errors.has_error("email"));
        assert!(errors.has_error("password"));

        let user = NewUser {
            email: "clerk@docconstruct.example".into(),
            password: "s3cret!".into(),
            roles: vec![],
        };
        assert!(contract.validate(&user).is_ok());
    }
}
