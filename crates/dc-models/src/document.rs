//! Uploaded and generated documents

use chrono::{DateTime, Utc};
use dc_core::types::lenient_datetime;
use dc_core::{EntityId, Identifiable, Named};
use serde::{Deserialize, Serialize};

use crate::status::DocumentStatus;
use crate::template::{DocumentTemplate, StoredFile};
use crate::upload::UploadFile;

/// Project document types known to the backend. `GENERAL_DOCUMENT_TYPE`
/// is the catch-all type that may hold any number of files.
pub const PROJECT_DOCUMENT_TYPES: [&str; 9] = [
    "אחראי לביקורת על הפסולת",
    "אחראי לתיאום עם מכון בקרה",
    "בקשה לתחילת עבודות",
    "מינוי אחראי לביצוע שלד (101)",
    "מינוי אחראי לביקורת על הביצוע",
    "מינוי מדביר מוסמך",
    "מינוי קבלן רשום",
    "רשימת בעלי תפקידים",
    GENERAL_DOCUMENT_TYPE,
];

pub const GENERAL_DOCUMENT_TYPE: &str = "כללי";

/// Professional document types known to the backend
pub const PROFESSIONAL_DOCUMENT_TYPES: [&str; 1] = ["license"];

/// A file uploaded against a project or a professional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawUploadedDocument")]
pub struct UploadedDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub document_type: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DocumentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professional_id: Option<EntityId>,
    #[serde(with = "lenient_datetime", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

pub type ProjectDocument = UploadedDocument;
pub type ProfessionalDocument = UploadedDocument;

impl UploadedDocument {
    /// File name shown to the user
    pub fn display_file_name(&self) -> &str {
        self.file_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.name)
    }

    /// Only PDFs get an inline preview.
    pub fn is_pdf(&self) -> bool {
        is_pdf_name(self.display_file_name())
            || self
                .file_type
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case("pdf") || t.ends_with("/pdf"))
    }
}

/// Whether a file name carries a `.pdf` extension
pub fn is_pdf_name(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
}

impl Identifiable for UploadedDocument {
    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }
}

impl Named for UploadedDocument {
    fn display_name(&self) -> &str {
        &self.name
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawUploadedDocument {
    id: Option<EntityId>,
    document_id: Option<EntityId>,
    project_document_id: Option<EntityId>,
    document_type: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    name: Option<String>,
    document_name: Option<String>,
    status: Option<DocumentStatus>,
    document_status: Option<DocumentStatus>,
    file_id: Option<EntityId>,
    file_name: Option<String>,
    file_type: Option<String>,
    professional_id: Option<EntityId>,
    #[serde(deserialize_with = "lenient_datetime::deserialize")]
    created_at: Option<DateTime<Utc>>,
}

impl From<RawUploadedDocument> for UploadedDocument {
    fn from(raw: RawUploadedDocument) -> Self {
        let name = raw
            .name
            .or(raw.document_name)
            .or_else(|| raw.file_name.clone())
            .unwrap_or_default();
        UploadedDocument {
            id: raw.id.or(raw.document_id).or(raw.project_document_id),
            document_type: raw.document_type.or(raw.kind).unwrap_or_default(),
            name,
            status: raw.status.or(raw.document_status),
            file_id: raw.file_id,
            file_name: raw.file_name,
            file_type: raw.file_type,
            professional_id: raw.professional_id,
            created_at: raw.created_at,
        }
    }
}

/// Metadata and payload for a document upload (multipart)
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub document_type: String,
    pub document_name: String,
    /// Sent with project uploads only
    pub status: Option<String>,
    pub file: UploadFile,
}

impl DocumentUpload {
    pub fn new(document_type: impl Into<String>, file: UploadFile) -> Self {
        Self {
            document_type: document_type.into(),
            document_name: file.file_name.clone(),
            status: None,
            file,
        }
    }

    pub fn named(mut self, document_name: impl Into<String>) -> Self {
        self.document_name = document_name.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// A document instantiated from a template for one project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawGeneratedDocument")]
pub struct GeneratedDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub project_id: Option<EntityId>,
    pub template_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professional_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DocumentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<DocumentTemplate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<StoredFile>,
    #[serde(with = "lenient_datetime", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl GeneratedDocument {
    /// Label for listings: the template name when embedded, the file name otherwise
    pub fn label(&self) -> String {
        if let Some(name) = self.template.as_ref().map(|t| t.name.as_str()).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        if let Some(file) = &self.file {
            return file.file_name.clone();
        }
        self.id
            .as_ref()
            .map(|id| format!("document {}", id))
            .unwrap_or_else(|| "document".to_string())
    }

    pub fn is_uploaded(&self) -> bool {
        matches!(
            self.status,
            Some(DocumentStatus::Uploaded) | Some(DocumentStatus::Signed) | Some(DocumentStatus::Delivered)
        )
    }
}

impl Identifiable for GeneratedDocument {
    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawGeneratedDocument {
    id: Option<EntityId>,
    document_id: Option<EntityId>,
    project_id: Option<EntityId>,
    template_id: Option<EntityId>,
    professional_id: Option<EntityId>,
    file_id: Option<EntityId>,
    status: Option<DocumentStatus>,
    document_status: Option<DocumentStatus>,
    template: Option<DocumentTemplate>,
    file: Option<StoredFile>,
    #[serde(deserialize_with = "lenient_datetime::deserialize")]
    created_at: Option<DateTime<Utc>>,
}

impl From<RawGeneratedDocument> for GeneratedDocument {
    fn from(raw: RawGeneratedDocument) -> Self {
        GeneratedDocument {
            id: raw.id.or(raw.document_id),
            project_id: raw.project_id,
            template_id: raw
                .template_id
                .or_else(|| raw.template.as_ref().and_then(|t| t.id.clone())),
            professional_id: raw.professional_id,
            file_id: raw
                .file_id
                .or_else(|| raw.file.as_ref().and_then(|f| f.id.clone())),
            status: raw.status.or(raw.document_status),
            template: raw.template,
            file: raw.file,
            created_at: raw.created_at,
        }
    }
}

/// Payload for `POST /documents/generate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateDocument {
    pub project_id: EntityId,
    pub template_id: EntityId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uploaded_document_spellings() {
        let doc: UploadedDocument = serde_json::from_str(
            r#"{"document_id": "d1", "document_type": "כללי", "document_name": "site.pdf"}"#,
        )
        .unwrap();
        assert_eq!(doc.id, Some(EntityId::from("d1")));
        assert_eq!(doc.name, "site.pdf");
        assert!(doc.is_pdf());

        let doc: UploadedDocument =
            serde_json::from_str(r#"{"id": 5, "type": "license", "file_name": "scan.PNG"}"#)
                .unwrap();
        assert_eq!(doc.document_type, "license");
        assert_eq!(doc.display_file_name(), "scan.PNG");
        assert!(!doc.is_pdf());
    }

    #[test]
    fn test_is_pdf_name() {
        assert!(is_pdf_name("a.PDF"));
        assert!(is_pdf_name("x.y.pdf"));
        assert!(!is_pdf_name("pdf"));
        assert!(!is_pdf_name("a.docx"));
    }

    #[test]
    fn test_generated_document_ids_from_nested() {
        let doc: GeneratedDocument = serde_json::from_str(
            r#"{
                "document_id": 9,
                "project_id": 1,
                "template": {"template_id": 3, "template_name": "Permit form"},
                "file": {"file_id": 11, "file_name": "permit.docx"}
            }"#,
        )
        .unwrap();
        assert_eq!(doc.id, Some(EntityId::from(9)));
        assert_eq!(doc.template_id, Some(EntityId::from(3)));
        assert_eq!(doc.file_id, Some(EntityId::from(11)));
        assert_eq!(doc.label(), "Permit form");
        assert!(!doc.is_uploaded());
    }

    #[test]
    fn test_general_type_is_in_catalog() {
        assert!(PROJECT_DOCUMENT_TYPES.contains(&GENERAL_DOCUMENT_TYPE));
    }
}
