//! Update contract for projects

use dc_core::error::ValidationErrors;
use dc_models::ProjectUpdate;

use super::base::{ProjectBaseContract, ProjectData};
use crate::base::{ChangeTracker, Contract, ValidationResult};

/// Contract for `PUT /project`
#[derive(Debug, Default, Clone)]
pub struct UpdateProjectContract {
    base: ProjectBaseContract,
    changes: ChangeTracker,
}

impl UpdateProjectContract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track what changed between the loaded project and the edit
    pub fn between(original: &ProjectUpdate, updated: &ProjectUpdate) -> Self {
        let mut changes = ChangeTracker::new();
        changes.compare("id", &original.id, &updated.id);
        changes.compare("name", &original.name, &updated.name);
        changes.compare("case_id", &original.case_id, &updated.case_id);
        changes.compare("description", &original.description, &updated.description);
        changes.compare("address", &original.address, &updated.address);
        changes.compare("status", &original.status, &updated.status);
        changes.compare("municipality_id", &original.municipality_id, &updated.municipality_id);
        changes.compare("due_date", &original.due_date, &updated.due_date);
        changes.compare("status_due_date", &original.status_due_date, &updated.status_due_date);
        changes.compare("start_date", &original.start_date, &updated.start_date);
        changes.compare("end_date", &original.end_date, &updated.end_date);
        changes.compare("permit_owner", &original.permit_owner, &updated.permit_owner);
        Self {
            base: ProjectBaseContract::new(),
            changes,
        }
    }

    pub fn mark_changed(&mut self, attribute: impl Into<String>) {
        self.changes.mark_changed(attribute);
    }

    pub fn is_changed(&self, attribute: &str) -> bool {
        self.changes.is_changed(attribute)
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    fn validate_writable(&self, errors: &mut ValidationErrors) {
        let mut changed: Vec<&String> = self.changes.changed_attributes().iter().collect();
        changed.sort();
        for attribute in changed {
            if !<Self as Contract<ProjectUpdate>>::is_writable(self, attribute) {
                errors.add(attribute.as_str(), "is not writable");
            }
        }
    }
}

impl<T: ProjectData> Contract<T> for UpdateProjectContract {
    fn validate(&self, entity: &T) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if entity.id().is_none() {
            errors.add("id", "can't be blank");
        }

        self.validate_writable(&mut errors);

        if let Err(base_errors) = self.base.validate(entity) {
            errors.merge(base_errors);
        }

        errors.into_result()
    }

    fn is_writable(&self, attribute: &str) -> bool {
        !matches!(
            attribute,
            "id" | "created_at" | "updated_at" | "professionals" | "documents" | "generated_documents"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_core::EntityId;

    fn loaded() -> ProjectUpdate {
        ProjectUpdate {
            id: Some(EntityId::from("p-1")),
            name: "Tower A".into(),
            address: "Herzl 1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_update_requires_id() {
        let mut update = loaded();
        update.id = None;
        let contract = UpdateProjectContract::new();
        assert!(contract.validate(&update).unwrap_err().has_error("id"));
    }

    #[test]
    fn test_update_tracks_changes() {
        let original = loaded();
        let mut edited = original.clone();
        edited.name = "Tower B".into();

        let contract = UpdateProjectContract::between(&original, &edited);
        assert!(contract.is_changed("name"));
        assert!(!contract.is_changed("address"));
        assert!(contract.validate(&edited).is_ok());
    }

    #[test]
    fn test_update_rejects_id_change() {
        let original = loaded();
        let mut edited = original.clone();
        edited.id = Some(EntityId::from("p-2"));

        let contract = UpdateProjectContract::between(&original, &edited);
        let errors = contract.validate(&edited).unwrap_err();
        assert_eq!(errors.get("id").unwrap(), &vec!["is not writable".to_string()]);
    }

    #[test]
    fn test_update_blank_name() {
        let original = loaded();
        let mut edited = original.clone();
        edited.name = "  ".into();
        let contract = UpdateProjectContract::between(&original, &edited);
        assert!(contract.validate(&edited).unwrap_err().has_error("name"));
    }

    #[test]
    fn test_no_changes() {
        let original = loaded();
        let contract = UpdateProjectContract::between(&original, &original.clone());
        assert!(!contract.has_changes());
    }
}
