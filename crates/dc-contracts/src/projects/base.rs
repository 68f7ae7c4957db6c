//! Base contract for projects

use chrono::NaiveDate;
use dc_core::error::ValidationErrors;
use dc_core::EntityId;
use dc_models::{NewProject, ProjectUpdate};

use crate::base::{require, Contract, ValidationResult};

pub const NAME_MAX_LENGTH: usize = 255;
pub const CASE_ID_MAX_LENGTH: usize = 64;

/// Project data for validation
pub trait ProjectData: Send + Sync {
    fn id(&self) -> Option<&EntityId>;
    fn name(&self) -> &str;
    fn address(&self) -> &str;
    fn case_id(&self) -> Option<&str>;
    fn due_date(&self) -> Option<NaiveDate>;
    fn status_due_date(&self) -> Option<NaiveDate>;
}

impl ProjectData for NewProject {
    fn id(&self) -> Option<&EntityId> {
        None
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn address(&self) -> &str {
        &self.address
    }
    fn case_id(&self) -> Option<&str> {
        self.case_id.as_deref()
    }
    fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }
    fn status_due_date(&self) -> Option<NaiveDate> {
        self.status_due_date
    }
}

impl ProjectData for ProjectUpdate {
    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn address(&self) -> &str {
        &self.address
    }
    fn case_id(&self) -> Option<&str> {
        self.case_id.as_deref()
    }
    fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }
    fn status_due_date(&self) -> Option<NaiveDate> {
        self.status_due_date
    }
}

/// Checks shared by create and update
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectBaseContract;

impl ProjectBaseContract {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_name(&self, name: &str, errors: &mut ValidationErrors) {
        if require(errors, "name", name) && name.chars().count() > NAME_MAX_LENGTH {
            errors.add("name", "is too long (maximum is 255 characters)");
        }
    }

    pub fn validate_address(&self, address: &str, errors: &mut ValidationErrors) {
        require(errors, "address", address);
    }

    /// The case id is optional, but when given it is a single token.
    pub fn validate_case_id(&self, case_id: Option<&str>, errors: &mut ValidationErrors) {
        let Some(case_id) = case_id.map(str::trim).filter(|c| !c.is_empty()) else {
            return;
        };
        if case_id.chars().count() > CASE_ID_MAX_LENGTH {
            errors.add("case_id", "is too long (maximum is 64 characters)");
        } else if case_id.chars().any(char::is_whitespace) {
            errors.add("case_id", "must not contain spaces");
        }
    }

    pub fn validate_dates(
        &self,
        due_date: Option<NaiveDate>,
        status_due_date: Option<NaiveDate>,
        errors: &mut ValidationErrors,
    ) {
        if let (Some(due), Some(status_due)) = (due_date, status_due_date) {
            if status_due > due {
                errors.add("status_due_date", "must be on or before the due date");
            }
        }
    }
}

impl<T: ProjectData> Contract<T> for ProjectBaseContract {
    fn validate(&self, entity: &T) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        self.validate_name(entity.name(), &mut errors);
        self.validate_address(entity.address(), &mut errors);
        self.validate_case_id(entity.case_id(), &mut errors);
        self.validate_dates(entity.due_date(), entity.status_due_date(), &mut errors);

        errors.into_result()
    }
}
