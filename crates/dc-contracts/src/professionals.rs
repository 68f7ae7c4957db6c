//! Professional contracts

use dc_core::error::ValidationErrors;
use dc_core::types::lenient_date;
use dc_models::{NewProfessional, Professional};
use validator::Validate;

use crate::base::{
    from_validator, is_blank, is_valid_email, is_valid_phone, require, Contract, ValidationResult,
};

pub const INVALID_EMAIL: &str = "is not a valid email address";
pub const INVALID_PHONE: &str = "is not a valid phone number";
pub const INVALID_DATE: &str = "is not a valid date";

/// Contract for `POST /professional`: every field is required.
#[derive(Debug, Default, Clone, Copy)]
pub struct CreateProfessionalContract;

impl CreateProfessionalContract {
    pub fn new() -> Self {
        Self
    }
}

impl Contract<NewProfessional> for CreateProfessionalContract {
    fn validate(&self, entity: &NewProfessional) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        require(&mut errors, "name", &entity.name);
        require(&mut errors, "address", &entity.address);
        if require(&mut errors, "phone", &entity.phone) && !is_valid_phone(&entity.phone) {
            errors.add("phone", INVALID_PHONE);
        }
        if require(&mut errors, "email", &entity.email) && !is_valid_email(&entity.email) {
            errors.add("email", INVALID_EMAIL);
        }
        require(&mut errors, "professional_type", &entity.professional_type);
        require(&mut errors, "national_id", &entity.national_id);
        require(&mut errors, "license_number", &entity.license_number);
        if require(&mut errors, "license_expiration_date", &entity.license_expiration_date)
            && lenient_date::parse(&entity.license_expiration_date).is_none()
        {
            errors.add("license_expiration_date", INVALID_DATE);
        }

        // Derive-level checks only fill in fields not already reported.
        let derived = from_validator(entity.validate());
        for (field, messages) in derived.errors {
            if !errors.has_error(&field) {
                for message in messages {
                    errors.add(field.clone(), message);
                }
            }
        }

        errors.into_result()
    }
}

/// Contract for `PUT /professional`
#[derive(Debug, Default, Clone, Copy)]
pub struct UpdateProfessionalContract;

impl UpdateProfessionalContract {
    pub fn new() -> Self {
        Self
    }
}

impl Contract<Professional> for UpdateProfessionalContract {
    fn validate(&self, entity: &Professional) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if entity.id.is_none() {
            errors.add("id", "can't be blank");
        }
        require(&mut errors, "name", &entity.name);

        if let Some(email) = entity.email.as_deref().filter(|e| !is_blank(e)) {
            if !is_valid_email(email) {
                errors.add("email", INVALID_EMAIL);
            }
        }
        if let Some(phone) = entity.phone.as_deref().filter(|p| !is_blank(p)) {
            if !is_valid_phone(phone) {
                errors.add("phone", INVALID_PHONE);
            }
        }

        errors.into_result()
    }

    fn is_writable(&self, attribute: &str) -> bool {
        !matches!(attribute, "id" | "documents" | "created_at" | "updated_at")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_core::EntityId;

    fn complete() -> NewProfessional {
        NewProfessional {
            name: "Dana Levi".into(),
            address: "Herzl 1, Haifa".into(),
            phone: "0521234567".into(),
            email: "dana@build.co.il".into(),
            professional_type: "אדריכל".into(),
            national_id: "123456789".into(),
            license_number: "L-77".into(),
            license_expiration_date: "2027-01-31".into(),
        }
    }

    #[test]
    fn test_complete_professional_is_valid() {
        assert!(CreateProfessionalContract::new().validate(&complete()).is_ok());
    }

    #[test]
    fn test_every_field_is_required() {
        let errors = CreateProfessionalContract::new()
            .validate(&NewProfessional::default())
            .unwrap_err();
        for field in [
            "name",
            "address",
            "phone",
            "email",
            "professional_type",
            "national_id",
            "license_number",
            "license_expiration_date",
        ] {
            assert_eq!(errors.get(field).unwrap(), &vec!["can't be blank".to_string()], "{field}");
        }
    }

    #[test]
    fn test_patterns() {
        let mut p = complete();
        p.email = "dana@build".into();
        p.phone = "12".into();
        p.license_expiration_date = "next year".into();
        let errors = CreateProfessionalContract::new().validate(&p).unwrap_err();
        assert_eq!(errors.get("email").unwrap(), &vec![INVALID_EMAIL.to_string()]);
        assert_eq!(errors.get("phone").unwrap(), &vec![INVALID_PHONE.to_string()]);
        assert!(errors.has_error("license_expiration_date"));
    }

    #[test]
    fn test_update_contract() {
        let mut p = Professional {
            id: Some(EntityId::from("a1")),
            name: "Dana".into(),
            ..Default::default()
        };
        assert!(UpdateProfessionalContract::new().validate(&p).is_ok());

        p.email = Some("broken".into());
        p.id = None;
        let errors = UpdateProfessionalContract::new().validate(&p).unwrap_err();
        assert!(errors.has_error("id"));
        assert!(errors.has_error("email"));
    }
}
