//! Document templates and stored files

use chrono::{DateTime, Utc};
use dc_core::types::lenient_datetime;
use dc_core::{EntityId, Identifiable, Named};
use serde::{Deserialize, Serialize};

use crate::professional::ProfessionalType;
use crate::upload::UploadFile;

/// A file held by the backend's storage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    #[serde(default, alias = "file_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
}

/// A blank document owned by one municipality and one professional type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawDocumentTemplate")]
pub struct DocumentTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub municipality_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professional_type_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professional_type: Option<ProfessionalType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<StoredFile>,
    #[serde(with = "lenient_datetime", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl DocumentTemplate {
    /// Whether this template is filled in by professionals of the given type
    pub fn is_for_type(&self, professional_type: &ProfessionalType) -> bool {
        match (&self.professional_type_id, &professional_type.id) {
            (Some(a), Some(b)) => a == b,
            _ => self
                .professional_type
                .as_ref()
                .is_some_and(|t| t.matches(professional_type)),
        }
    }
}

impl Identifiable for DocumentTemplate {
    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }
}

impl Named for DocumentTemplate {
    fn display_name(&self) -> &str {
        &self.name
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawDocumentTemplate {
    id: Option<EntityId>,
    template_id: Option<EntityId>,
    name: Option<String>,
    template_name: Option<String>,
    description: Option<String>,
    template_description: Option<String>,
    municipality_id: Option<EntityId>,
    professional_type_id: Option<EntityId>,
    professional_type: Option<ProfessionalType>,
    file: Option<StoredFile>,
    file_id: Option<EntityId>,
    #[serde(deserialize_with = "lenient_datetime::deserialize")]
    created_at: Option<DateTime<Utc>>,
}

impl From<RawDocumentTemplate> for DocumentTemplate {
    fn from(raw: RawDocumentTemplate) -> Self {
        let professional_type_id = raw
            .professional_type_id
            .or_else(|| raw.professional_type.as_ref().and_then(|t| t.id.clone()));
        let file = match (raw.file, raw.file_id) {
            (Some(mut file), Some(file_id)) => {
                file.id.get_or_insert(file_id);
                Some(file)
            }
            (Some(file), None) => Some(file),
            (None, Some(file_id)) => Some(StoredFile {
                id: Some(file_id),
                ..StoredFile::default()
            }),
            (None, None) => None,
        };

        DocumentTemplate {
            id: raw.template_id.or(raw.id),
            name: raw.template_name.or(raw.name).unwrap_or_default(),
            description: raw.template_description.or(raw.description),
            municipality_id: raw.municipality_id,
            professional_type_id,
            professional_type: raw.professional_type,
            file,
            created_at: raw.created_at,
        }
    }
}

/// Form data for `POST /documents/templates` (multipart)
#[derive(Debug, Clone, Default)]
pub struct NewTemplate {
    pub name: String,
    pub description: Option<String>,
    pub professional_type_id: Option<EntityId>,
    pub municipality_id: Option<EntityId>,
    /// Field names the generator must fill, sent as a JSON array
    pub required_fields: Vec<String>,
    pub file: Option<UploadFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_spellings() {
        let t: DocumentTemplate = serde_json::from_str(
            r#"{
                "template_id": 4,
                "template_name": "Structural sign-off",
                "municipality_id": 2,
                "professional_type": {"type_id": 7, "type_name": "מהנדס אחראי שלד"},
                "file_id": 30
            }"#,
        )
        .unwrap();
        assert_eq!(t.id, Some(EntityId::from(4)));
        assert_eq!(t.name, "Structural sign-off");
        assert_eq!(t.professional_type_id, Some(EntityId::from(7)));
        assert_eq!(t.file.as_ref().and_then(|f| f.id.clone()), Some(EntityId::from(30)));
        assert!(t.is_for_type(&ProfessionalType::with_id(7, "")));
        assert!(!t.is_for_type(&ProfessionalType::with_id(8, "")));
    }

    #[test]
    fn test_template_by_type_name() {
        let t: DocumentTemplate =
            serde_json::from_str(r#"{"id": "t1", "name": "Form", "professional_type": "אדריכל"}"#)
                .unwrap();
        assert!(t.is_for_type(&ProfessionalType::named("אדריכל")));
    }
}
