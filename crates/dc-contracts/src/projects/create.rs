//! Create contract for projects

use dc_core::error::ValidationErrors;

use super::base::{ProjectBaseContract, ProjectData};
use crate::base::{Contract, ValidationResult};

/// Contract for `POST /project`
#[derive(Debug, Default, Clone, Copy)]
pub struct CreateProjectContract {
    base: ProjectBaseContract,
}

impl CreateProjectContract {
    pub fn new() -> Self {
        Self {
            base: ProjectBaseContract::new(),
        }
    }
}

impl<T: ProjectData> Contract<T> for CreateProjectContract {
    fn validate(&self, entity: &T) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if entity.id().is_some() {
            errors.add("id", "must be blank for a new project");
        }

        if let Err(base_errors) = self.base.validate(entity) {
            errors.merge(base_errors);
        }

        errors.into_result()
    }

    fn is_writable(&self, attribute: &str) -> bool {
        matches!(
            attribute,
            "name"
                | "case_id"
                | "description"
                | "address"
                | "status"
                | "municipality_id"
                | "due_date"
                | "status_due_date"
                | "professionals"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_models::NewProject;

    #[test]
    fn test_create_requires_name_and_address() {
        let contract = CreateProjectContract::new();
        let errors = contract.validate(&NewProject::default()).unwrap_err();
        assert_eq!(
            errors.full_messages(),
            vec!["address can't be blank", "name can't be blank"]
        );
    }

    #[test]
    fn test_create_valid() {
        let contract = CreateProjectContract::new();
        let project = NewProject {
            name: "Tower A".into(),
            address: "Herzl 1".into(),
            ..Default::default()
        };
        assert!(contract.validate(&project).is_ok());
    }

    #[test]
    fn test_writable_attributes() {
        let contract = CreateProjectContract::new();
        assert!(<CreateProjectContract as Contract<NewProject>>::is_writable(&contract, "name"));
        assert!(<CreateProjectContract as Contract<NewProject>>::is_writable(
            &contract,
            "professionals"
        ));
        assert!(!<CreateProjectContract as Contract<NewProject>>::is_writable(
            &contract,
            "documents"
        ));
    }
}
