//! Per-step contracts for the project creation wizard
//!
//! Each step has one required condition and one message. Steps after the
//! template selection have nothing left to validate.

use std::fmt;

use dc_core::error::ValidationErrors;
use dc_core::EntityId;
use dc_models::{NewProject, ProjectAssignment};
use serde::{Deserialize, Serialize};

use crate::base::{is_blank, Contract, ValidationResult};

pub const FILL_REQUIRED_FIELDS: &str = "Please fill in all required fields.";
pub const SELECT_MUNICIPALITY: &str = "Please select a municipality.";
pub const SELECT_PROFESSIONAL: &str = "Please select at least one professional.";
pub const SELECT_TEMPLATE: &str = "Please select at least one document template.";

/// The five wizard steps, numbered from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    BasicInfo = 1,
    SelectMunicipality = 2,
    SelectProfessionals = 3,
    GenerateDocuments = 4,
    Review = 5,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::BasicInfo,
        WizardStep::SelectMunicipality,
        WizardStep::SelectProfessionals,
        WizardStep::GenerateDocuments,
        WizardStep::Review,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        Self::from_number(self.number().checked_sub(1)?)
    }

    pub fn is_first(self) -> bool {
        self == WizardStep::BasicInfo
    }

    pub fn is_last(self) -> bool {
        self == WizardStep::Review
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::BasicInfo => "Project Information",
            WizardStep::SelectMunicipality => "Select Municipality",
            WizardStep::SelectProfessionals => "Assign Professionals",
            WizardStep::GenerateDocuments => "Generate Documents",
            WizardStep::Review => "Review & Upload",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/5 {}", self.number(), self.title())
    }
}

/// Everything the wizard has collected so far
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WizardForm {
    pub name: String,
    pub description: String,
    pub address: String,
    pub case_id: Option<String>,
    pub municipality_id: Option<EntityId>,
    /// At most one professional per professional type
    pub professionals: Vec<ProjectAssignment>,
    pub selected_templates: Vec<EntityId>,
}

impl WizardForm {
    /// Choose `professional_id` for its type, replacing any earlier choice
    pub fn select_professional(
        &mut self,
        professional_type_id: Option<EntityId>,
        professional_id: EntityId,
    ) {
        self.professionals
            .retain(|a| a.professional_type_id != professional_type_id);
        self.professionals.push(ProjectAssignment {
            professional_id,
            professional_type_id,
        });
    }

    pub fn deselect_professional_type(&mut self, professional_type_id: Option<&EntityId>) {
        self.professionals
            .retain(|a| a.professional_type_id.as_ref() != professional_type_id);
    }

    /// Add the template if absent, remove it otherwise. Returns whether it
    /// is selected afterwards.
    pub fn toggle_template(&mut self, template_id: EntityId) -> bool {
        if let Some(pos) = self.selected_templates.iter().position(|t| *t == template_id) {
            self.selected_templates.remove(pos);
            false
        } else {
            self.selected_templates.push(template_id);
            true
        }
    }

    pub fn is_template_selected(&self, template_id: &EntityId) -> bool {
        self.selected_templates.contains(template_id)
    }

    /// The `POST /project` payload
    pub fn to_new_project(&self) -> NewProject {
        let description = self.description.trim();
        NewProject {
            name: self.name.trim().to_string(),
            case_id: self.case_id.clone().filter(|c| !is_blank(c)),
            description: (!description.is_empty()).then(|| description.to_string()),
            address: self.address.trim().to_string(),
            municipality_id: self.municipality_id.clone(),
            professionals: self.professionals.clone(),
            ..Default::default()
        }
    }
}

/// Validates the form for leaving one step
#[derive(Debug, Clone, Copy)]
pub struct WizardStepContract {
    step: WizardStep,
}

impl WizardStepContract {
    pub fn new(step: WizardStep) -> Self {
        Self { step }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }
}

impl Contract<WizardForm> for WizardStepContract {
    fn validate(&self, form: &WizardForm) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        match self.step {
            WizardStep::BasicInfo => {
                if is_blank(&form.name) || is_blank(&form.address) {
                    errors.add_base(FILL_REQUIRED_FIELDS);
                }
            }
            WizardStep::SelectMunicipality => {
                if form.municipality_id.is_none() {
                    errors.add_base(SELECT_MUNICIPALITY);
                }
            }
            WizardStep::SelectProfessionals => {
                if form.professionals.is_empty() {
                    errors.add_base(SELECT_PROFESSIONAL);
                }
            }
            WizardStep::GenerateDocuments => {
                if form.selected_templates.is_empty() {
                    errors.add_base(SELECT_TEMPLATE);
                }
            }
            WizardStep::Review => {}
        }

        errors.into_result()
    }
}
