//! Municipality model

use chrono::{DateTime, Utc};
use dc_core::types::lenient_datetime;
use dc_core::{EntityId, Identifiable, Named, Timestamped};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::template::DocumentTemplate;

/// A permitting authority and the templates it requires
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMunicipality")]
pub struct Municipality {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<DocumentTemplate>,
    #[serde(with = "lenient_datetime", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(with = "lenient_datetime", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Municipality {
    /// Fields editable through `PUT /municipalities/:id`
    pub fn to_update(&self) -> NewMunicipality {
        NewMunicipality {
            name: self.name.clone(),
            state: self.state.clone(),
            county: self.county.clone(),
            address: self.address.clone(),
            contact_person: self.contact_person.clone(),
            contact_email: self.contact_email.clone(),
            contact_phone: self.contact_phone.clone(),
            website: self.website.clone(),
        }
    }
}

impl Identifiable for Municipality {
    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }
}

impl Named for Municipality {
    fn display_name(&self) -> &str {
        &self.name
    }
}

impl Timestamped for Municipality {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawMunicipality {
    id: Option<EntityId>,
    municipality_id: Option<EntityId>,
    name: Option<String>,
    municipality_name: Option<String>,
    state: Option<String>,
    county: Option<String>,
    address: Option<String>,
    contact_person: Option<String>,
    contact_email: Option<String>,
    email: Option<String>,
    contact_phone: Option<String>,
    phone: Option<String>,
    website: Option<String>,
    templates: Option<Vec<DocumentTemplate>>,
    document_templates: Option<Vec<DocumentTemplate>>,
    #[serde(deserialize_with = "lenient_datetime::deserialize")]
    created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_datetime::deserialize")]
    updated_at: Option<DateTime<Utc>>,
}

impl From<RawMunicipality> for Municipality {
    fn from(raw: RawMunicipality) -> Self {
        let id = raw.municipality_id.or(raw.id);
        let mut templates = raw
            .templates
            .or(raw.document_templates)
            .unwrap_or_default();
        for template in &mut templates {
            if template.municipality_id.is_none() {
                template.municipality_id = id.clone();
            }
        }

        Municipality {
            id,
            name: raw.name.or(raw.municipality_name).unwrap_or_default(),
            state: raw.state,
            county: raw.county,
            address: raw.address,
            contact_person: raw.contact_person,
            contact_email: raw.contact_email.or(raw.email),
            contact_phone: raw.contact_phone.or(raw.phone),
            website: raw.website,
            templates,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        }
    }
}

/// Payload for `POST /municipalities` and `PUT /municipalities/:id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewMunicipality {
    #[validate(length(min = 1, message = "can't be blank"))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[validate(email(message = "is not a valid email address"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_municipality_with_nested_templates() {
        let m: Municipality = serde_json::from_str(
            r#"{
                "municipality_id": 2,
                "name": "Haifa",
                "email": "permits@haifa.example",
                "document_templates": [{"template_id": 1, "template_name": "Form A"}]
            }"#,
        )
        .unwrap();
        assert_eq!(m.id, Some(EntityId::from(2)));
        assert_eq!(m.contact_email.as_deref(), Some("permits@haifa.example"));
        assert_eq!(m.templates.len(), 1);
        assert_eq!(m.templates[0].municipality_id, Some(EntityId::from(2)));
    }

    #[test]
    fn test_update_payload_keeps_contact_fields() {
        let m = Municipality {
            id: Some("m1".into()),
            name: "Tel Aviv".into(),
            website: Some("https://tlv.example".into()),
            ..Default::default()
        };
        let update = serde_json::to_value(m.to_update()).unwrap();
        assert_eq!(update["name"], "Tel Aviv");
        assert_eq!(update["website"], "https://tlv.example");
        assert!(update.get("id").is_none());
    }
}
