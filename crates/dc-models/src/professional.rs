//! Professional model
//!
//! Licensed contractors, engineers and architects that get attached to
//! projects and sign documents.

use chrono::{DateTime, NaiveDate, Utc};
use dc_core::types::{lenient_date, lenient_datetime};
use dc_core::{EntityId, Identifiable, Named, Timestamped};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::Validate;

use crate::document::UploadedDocument;
use crate::status::ProfessionalStatus;

/// The canonical professional types known to the backend.
pub const KNOWN_PROFESSIONAL_TYPES: [&str; 5] = [
    "מהנדס אחראי ביקורת",
    "מהנדס אחראי שלד",
    "אדריכל",
    "מדביר",
    "קבלן רשום",
];

/// Kind of professional.
///
/// Decodes from a bare name or a `{type_id, type_name}` object and encodes
/// as its name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProfessionalType {
    pub id: Option<EntityId>,
    pub name: String,
}

impl ProfessionalType {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    pub fn with_id(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
        }
    }

    /// Key used to group professionals: the id when known, the name otherwise.
    pub fn key(&self) -> String {
        match &self.id {
            Some(id) => id.to_string(),
            None => self.name.clone(),
        }
    }

    /// Map a free-text type (as read off a scanned license) onto one of
    /// the known professional types. Unrecognized text is returned as is.
    pub fn classify(raw: &str) -> String {
        let raw = raw.trim();
        if KNOWN_PROFESSIONAL_TYPES.contains(&raw) {
            return raw.to_string();
        }
        if raw.contains("מהנדס") {
            KNOWN_PROFESSIONAL_TYPES[0].to_string()
        } else if raw.contains("אדריכל") {
            KNOWN_PROFESSIONAL_TYPES[2].to_string()
        } else if raw.contains("מדביר") {
            KNOWN_PROFESSIONAL_TYPES[3].to_string()
        } else if raw.contains("קבלן") {
            KNOWN_PROFESSIONAL_TYPES[4].to_string()
        } else {
            raw.to_string()
        }
    }

    pub fn matches(&self, other: &ProfessionalType) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => !self.name.is_empty() && self.name == other.name,
        }
    }
}

impl Serialize for ProfessionalType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

impl<'de> Deserialize<'de> for ProfessionalType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Name(String),
            Object {
                #[serde(default, alias = "id")]
                type_id: Option<EntityId>,
                #[serde(default, alias = "name")]
                type_name: Option<String>,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Name(name) => ProfessionalType::named(name.trim()),
            Raw::Object { type_id, type_name } => ProfessionalType {
                id: type_id,
                name: type_name.unwrap_or_default(),
            },
        })
    }
}

/// A licensed professional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawProfessional")]
pub struct Professional {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub license_expiration_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professional_type: Option<ProfessionalType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProfessionalStatus>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<UploadedDocument>,
    #[serde(with = "lenient_datetime", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(with = "lenient_datetime", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Professional {
    pub fn type_name(&self) -> Option<&str> {
        self.professional_type
            .as_ref()
            .map(|t| t.name.as_str())
            .filter(|name| !name.is_empty())
    }

    pub fn type_id(&self) -> Option<&EntityId> {
        self.professional_type.as_ref().and_then(|t| t.id.as_ref())
    }

    /// Payload for `PUT /professional`; uploaded documents are managed
    /// through their own endpoints and never sent back.
    pub fn to_update(&self) -> Professional {
        Professional {
            documents: Vec::new(),
            ..self.clone()
        }
    }
}

impl Identifiable for Professional {
    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }
}

impl Named for Professional {
    fn display_name(&self) -> &str {
        &self.name
    }
}

impl Timestamped for Professional {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawProfessional {
    id: Option<EntityId>,
    professional_id: Option<EntityId>,
    proffsional_id: Option<EntityId>,

    name: Option<String>,
    professional_name: Option<String>,
    proffsional_name: Option<String>,

    national_id: Option<String>,
    id_number: Option<String>,
    proffsional_national_id: Option<String>,

    email: Option<String>,
    proffsional_email: Option<String>,
    phone: Option<String>,
    proffsional_phone: Option<String>,
    address: Option<String>,
    proffsional_address: Option<String>,

    license_number: Option<String>,
    proffsional_license_number: Option<String>,
    #[serde(deserialize_with = "lenient_date::deserialize")]
    license_expiration_date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_date::deserialize")]
    proffsional_license_expiration_date: Option<NaiveDate>,

    professional_type: Option<ProfessionalType>,
    proffsional_type: Option<ProfessionalType>,
    professional_type_id: Option<EntityId>,

    status: Option<ProfessionalStatus>,
    proffsional_status: Option<ProfessionalStatus>,

    documents: Option<Vec<UploadedDocument>>,

    #[serde(deserialize_with = "lenient_datetime::deserialize")]
    created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_datetime::deserialize")]
    updated_at: Option<DateTime<Utc>>,
}

impl From<RawProfessional> for Professional {
    fn from(raw: RawProfessional) -> Self {
        let mut professional_type = raw.professional_type.or(raw.proffsional_type);
        if let Some(type_id) = raw.professional_type_id {
            match professional_type.as_mut() {
                Some(t) if t.id.is_none() => t.id = Some(type_id),
                Some(_) => {}
                None => {
                    professional_type = Some(ProfessionalType {
                        id: Some(type_id),
                        name: String::new(),
                    })
                }
            }
        }

        Professional {
            id: raw.id.or(raw.professional_id).or(raw.proffsional_id),
            name: raw
                .name
                .or(raw.professional_name)
                .or(raw.proffsional_name)
                .unwrap_or_default(),
            national_id: raw
                .national_id
                .or(raw.proffsional_national_id)
                .or(raw.id_number),
            email: raw.email.or(raw.proffsional_email),
            phone: raw.phone.or(raw.proffsional_phone),
            address: raw.address.or(raw.proffsional_address),
            license_number: raw.license_number.or(raw.proffsional_license_number),
            license_expiration_date: raw
                .license_expiration_date
                .or(raw.proffsional_license_expiration_date),
            professional_type,
            status: raw.status.or(raw.proffsional_status),
            documents: raw.documents.unwrap_or_default(),
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        }
    }
}

/// Payload for `POST /professional`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewProfessional {
    #[validate(length(min = 1, message = "can't be blank"))]
    pub name: String,
    #[validate(length(min = 1, message = "can't be blank"))]
    pub address: String,
    #[validate(length(min = 1, message = "can't be blank"))]
    pub phone: String,
    #[validate(email(message = "is not a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "can't be blank"))]
    pub professional_type: String,
    #[validate(length(min = 1, message = "can't be blank"))]
    pub national_id: String,
    #[validate(length(min = 1, message = "can't be blank"))]
    pub license_number: String,
    #[validate(length(min = 1, message = "can't be blank"))]
    pub license_expiration_date: String,
}

impl From<Professional> for NewProfessional {
    /// Prefill a creation form, e.g. from a scanned license
    fn from(p: Professional) -> Self {
        NewProfessional {
            name: p.name,
            address: p.address.unwrap_or_default(),
            phone: p.phone.unwrap_or_default(),
            email: p.email.unwrap_or_default(),
            professional_type: p.professional_type.map(|t| t.name).unwrap_or_default(),
            national_id: p.national_id.unwrap_or_default(),
            license_number: p.license_number.unwrap_or_default(),
            license_expiration_date: p
                .license_expiration_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_professional_type_as_string_or_object() {
        let a: ProfessionalType = serde_json::from_str("\"אדריכל\"").unwrap();
        assert_eq!(a.name, "אדריכל");
        assert!(a.id.is_none());

        let b: ProfessionalType =
            serde_json::from_str(r#"{"type_id": 3, "type_name": "Architect"}"#).unwrap();
        assert_eq!(b.id, Some(EntityId::from(3)));
        assert_eq!(b.name, "Architect");
        assert_eq!(serde_json::to_string(&b).unwrap(), "\"Architect\"");
    }

    #[test]
    fn test_decode_backend_spelling() {
        let json = r#"{
            "proffsional_id": "a1",
            "proffsional_name": "Dana Levi",
            "proffsional_national_id": "123456789",
            "proffsional_email": "dana@example.com",
            "proffsional_phone": "0501234567",
            "proffsional_address": "Herzl 1",
            "proffsional_license_number": "L-77",
            "proffsional_license_expiration_date": "2026-01-31",
            "proffsional_type": "אדריכל",
            "proffsional_status": "Active"
        }"#;
        let p: Professional = serde_json::from_str(json).unwrap();
        assert_eq!(p.id, Some(EntityId::from("a1")));
        assert_eq!(p.name, "Dana Levi");
        assert_eq!(p.type_name(), Some("אדריכל"));
        assert_eq!(p.status, Some(ProfessionalStatus::Active));
        assert_eq!(p.license_expiration_date, NaiveDate::from_ymd_opt(2026, 1, 31));
    }

    #[test]
    fn test_decode_frontend_spelling_with_type_object() {
        let json = r#"{
            "professional_id": 12,
            "id": 12,
            "name": "Avi",
            "professional_type_id": 4,
            "professional_type": {"type_name": "קבלן רשום"},
            "status": "active"
        }"#;
        let p: Professional = serde_json::from_str(json).unwrap();
        assert_eq!(p.id, Some(EntityId::from(12)));
        assert_eq!(p.type_id(), Some(&EntityId::from(4)));
        assert_eq!(p.type_name(), Some("קבלן רשום"));
    }

    #[test]
    fn test_encode_canonical() {
        let p = Professional {
            id: Some("p1".into()),
            name: "Noa".into(),
            professional_type: Some(ProfessionalType::named("מדביר")),
            ..Default::default()
        };
        let value = serde_json::to_value(&p).unwrap();
        assert_eq!(value["id"], "p1");
        assert_eq!(value["professional_type"], "מדביר");
        assert!(value.get("documents").is_none());
    }

    #[test]
    fn test_classify() {
        assert_eq!(ProfessionalType::classify("מהנדס בניין"), "מהנדס אחראי ביקורת");
        assert_eq!(ProfessionalType::classify("קבלן ראשי"), "קבלן רשום");
        assert_eq!(ProfessionalType::classify("יועץ"), "יועץ");
    }
}
