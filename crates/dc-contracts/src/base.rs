//! Base contract system

use std::collections::HashSet;
use std::sync::LazyLock;

use dc_core::error::ValidationErrors;
use regex::Regex;

/// Result of contract validation
pub type ValidationResult = Result<(), ValidationErrors>;

pub const BLANK: &str = "can't be blank";

pub(crate) static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

pub(crate) static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?1?\d{9,15}$").unwrap());

/// Base contract trait
pub trait Contract<T>: Send + Sync {
    /// Validate the entity
    fn validate(&self, entity: &T) -> ValidationResult;

    /// Check if an attribute is writable
    fn is_writable(&self, _attribute: &str) -> bool {
        true
    }
}

/// Change tracking for update contracts
#[derive(Debug, Default, Clone)]
pub struct ChangeTracker {
    changed_attributes: HashSet<String>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_changed(&mut self, attribute: impl Into<String>) {
        self.changed_attributes.insert(attribute.into());
    }

    /// Mark `attribute` when the two values differ
    pub fn compare<V: PartialEq>(&mut self, attribute: &str, before: &V, after: &V) {
        if before != after {
            self.mark_changed(attribute);
        }
    }

    pub fn is_changed(&self, attribute: &str) -> bool {
        self.changed_attributes.contains(attribute)
    }

    pub fn is_empty(&self) -> bool {
        self.changed_attributes.is_empty()
    }

    pub fn changed_attributes(&self) -> &HashSet<String> {
        &self.changed_attributes
    }
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value.trim())
}

/// Spaces and dashes are ignored; the rest must be 9-15 digits with an
/// optional leading `+` and country code 1.
pub fn is_valid_phone(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    PHONE_PATTERN.is_match(&compact)
}

/// Require a non-blank value for `field`
pub fn require(errors: &mut ValidationErrors, field: &str, value: &str) -> bool {
    if is_blank(value) {
        errors.add(field, BLANK);
        false
    } else {
        true
    }
}

/// Convert `validator` derive output into our error collection.
///
/// A field reported blank keeps only the blank message.
pub fn from_validator(result: Result<(), validator::ValidationErrors>) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let Err(failures) = result else {
        return errors;
    };

    for (field, field_errors) in failures.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("is invalid ({})", e.code))
            })
            .collect();
        if messages.iter().any(|m| m == BLANK) {
            errors.add(field, BLANK);
        } else {
            for message in messages {
                errors.add(field, message);
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_tracker() {
        let mut tracker = ChangeTracker::new();
        assert!(!tracker.is_changed("name"));

        tracker.compare("name", &"a", &"b");
        tracker.compare("address", &"x", &"x");
        assert!(tracker.is_changed("name"));
        assert!(!tracker.is_changed("address"));
        assert_eq!(tracker.changed_attributes().len(), 1);
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("dana@build.co.il"));
        assert!(is_valid_email(" a.b+c@x.io "));
        assert!(!is_valid_email("dana@build"));
        assert!(!is_valid_email("not an email"));
    }

    #[test]
    fn test_phone_pattern() {
        assert!(is_valid_phone("0521234567"));
        assert!(is_valid_phone("+972521234567"));
        assert!(is_valid_phone("052-123-4567"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("phone"));
    }

    #[test]
    fn test_require() {
        let mut errors = ValidationErrors::new();
        assert!(require(&mut errors, "name", "Tower"));
        assert!(!require(&mut errors, "address", "   "));
        assert_eq!(errors.get("address").unwrap(), &vec![BLANK.to_string()]);
    }
}
