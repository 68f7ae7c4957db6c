//! Authentication and user management shapes

use chrono::{DateTime, Utc};
use dc_core::types::lenient_datetime;
use dc_core::{EntityId, Identifiable};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /auth/login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response of `POST /auth/login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "accessToken", alias = "token")]
    pub access_token: String,
    #[serde(default, alias = "userId")]
    pub user_id: Option<EntityId>,
    #[serde(alias = "userEmail")]
    pub email: String,
    #[serde(default, alias = "userRoles")]
    pub roles: Vec<String>,
}

/// Response of `GET /auth/profile`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, alias = "user_id")]
    pub id: Option<EntityId>,
    #[serde(default, alias = "userEmail")]
    pub email: String,
    #[serde(default, alias = "userRoles")]
    pub roles: Vec<String>,
}

/// An account as listed by `GET /users`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagedUser {
    #[serde(default, alias = "user_id", alias = "_id")]
    pub id: Option<EntityId>,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(
        default,
        with = "lenient_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Identifiable for ManagedUser {
    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }
}

/// Body of `POST /users`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewUser {
    #[validate(email(message = "is not a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "can't be blank"))]
    pub password: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Password change form; only `current_password` and `new_password`
/// go over the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    #[serde(skip_serializing, default)]
    pub confirm_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_spellings() {
        let a: LoginResponse = serde_json::from_str(
            r#"{"access_token": "t", "user_id": 4, "email": "a@b.io"}"#,
        )
        .unwrap();
        assert!(a.roles.is_empty());
        assert_eq!(a.user_id, Some(EntityId::from(4)));

        let b: LoginResponse = serde_json::from_str(
            r#"{"accessToken": "t", "userEmail": "a@b.io", "userRoles": ["admin"]}"#,
        )
        .unwrap();
        assert_eq!(b.access_token, "t");
        assert_eq!(b.roles, vec!["admin"]);
    }

    #[test]
    fn test_password_change_wire_shape() {
        let change = PasswordChange {
            current_password: "old".into(),
            new_password: "new-password".into(),
            confirm_password: "new-password".into(),
        };
        let value = serde_json::to_value(&change).unwrap();
        assert!(value.get("confirm_password").is_none());
        assert_eq!(value["new_password"], "new-password");
    }
}
