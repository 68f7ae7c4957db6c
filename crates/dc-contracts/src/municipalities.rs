//! Municipality and template contracts

use dc_core::error::ValidationErrors;
use dc_models::{NewMunicipality, NewTemplate};
use validator::Validate;

use crate::base::{from_validator, is_blank, Contract, ValidationResult};

pub const NAME_REQUIRED: &str = "Municipality name is required";
pub const MUNICIPALITY_MISSING: &str =
    "Municipality ID is missing. Please create a municipality first.";
pub const TEMPLATE_INCOMPLETE: &str =
    "Please fill in all required fields and upload a template file.";

/// Contract for `POST`/`PUT /municipalities`
#[derive(Debug, Default, Clone, Copy)]
pub struct CreateMunicipalityContract;

impl CreateMunicipalityContract {
    pub fn new() -> Self {
        Self
    }
}

impl Contract<NewMunicipality> for CreateMunicipalityContract {
    fn validate(&self, entity: &NewMunicipality) -> ValidationResult {
        let mut errors = from_validator(entity.validate());

        errors.errors.remove("name");
        if is_blank(&entity.name) {
            errors.add_base(NAME_REQUIRED);
        }

        errors.into_result()
    }
}

/// Contract for the template upload that follows municipality creation
#[derive(Debug, Default, Clone, Copy)]
pub struct NewTemplateContract;

impl NewTemplateContract {
    pub fn new() -> Self {
        Self
    }
}

impl Contract<NewTemplate> for NewTemplateContract {
    fn validate(&self, entity: &NewTemplate) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if entity.municipality_id.is_none() {
            errors.add_base(MUNICIPALITY_MISSING);
            return Err(errors);
        }

        let file_missing = entity.file.as_ref().map_or(true, |f| f.is_empty());
        if is_blank(&entity.name) || entity.professional_type_id.is_none() || file_missing {
            errors.add_base(TEMPLATE_INCOMPLETE);
        }

        errors.into_result()
    }
}
