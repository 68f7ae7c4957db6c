//! Project model
//!
//! A construction permit case: address, municipality, assigned
//! professionals and the documents gathered for the permit.

use chrono::{DateTime, NaiveDate, Utc};
use dc_core::types::{blank_as_none, lenient_date, lenient_datetime};
use dc_core::{EntityId, Identifiable, Named, Timestamped};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

use crate::document::{GeneratedDocument, UploadedDocument};
use crate::municipality::Municipality;
use crate::professional::Professional;
use crate::status::ProjectStatus;

/// A permit project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawProject")]
pub struct Project {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality_id: Option<EntityId>,
    #[serde(with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub status_due_date: Option<NaiveDate>,
    #[serde(with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permit_owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality: Option<Municipality>,
    /// Assigned professionals, unified from the flat and the join-row shapes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub professionals: Vec<ProjectProfessional>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<UploadedDocument>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub generated_documents: Vec<GeneratedDocument>,
    #[serde(with = "lenient_datetime", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(with = "lenient_datetime", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    pub fn professional_ids(&self) -> Vec<&EntityId> {
        self.professionals
            .iter()
            .filter_map(ProjectProfessional::professional_id)
            .collect()
    }

    pub fn has_professional(&self, professional_id: &EntityId) -> bool {
        self.professionals
            .iter()
            .any(|pp| pp.professional_id() == Some(professional_id))
    }

    pub fn documents_of_type<'a>(
        &'a self,
        document_type: &'a str,
    ) -> impl Iterator<Item = &'a UploadedDocument> + 'a {
        self.documents
            .iter()
            .filter(move |d| d.document_type == document_type)
    }

    /// Payload for `PUT /project`
    pub fn to_update(&self) -> ProjectUpdate {
        ProjectUpdate::from(self)
    }
}

impl Identifiable for Project {
    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }
}

impl Named for Project {
    fn display_name(&self) -> &str {
        &self.name
    }
}

impl Timestamped for Project {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

/// One professional's assignment to a project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawProjectProfessional")]
pub struct ProjectProfessional {
    /// Join row id, absent when the backend sent a flat professional list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub professional_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professional: Option<Professional>,
}

impl ProjectProfessional {
    pub fn professional_id(&self) -> Option<&EntityId> {
        self.professional_id
            .as_ref()
            .or_else(|| self.professional.as_ref().and_then(|p| p.id.as_ref()))
    }

    pub fn display_name(&self) -> &str {
        self.professional
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("")
    }
}

impl From<Professional> for ProjectProfessional {
    fn from(professional: Professional) -> Self {
        ProjectProfessional {
            id: None,
            professional_id: professional.id.clone(),
            role: professional.type_name().map(str::to_string),
            professional: Some(professional),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawProjectProfessional {
    pp_id: Option<EntityId>,
    project_professional_id: Option<EntityId>,
    id: Option<EntityId>,
    professional_id: Option<EntityId>,
    role: Option<String>,
    professional: Option<Professional>,
}

impl From<RawProjectProfessional> for ProjectProfessional {
    fn from(raw: RawProjectProfessional) -> Self {
        let professional_id = raw
            .professional_id
            .or_else(|| raw.professional.as_ref().and_then(|p| p.id.clone()));
        ProjectProfessional {
            id: raw.pp_id.or(raw.project_professional_id).or(raw.id),
            professional_id,
            role: raw.role,
            professional: raw.professional,
        }
    }
}

#[derive(Deserialize, Default)]
struct PermitOwner {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawProject {
    id: Option<EntityId>,
    project_id: Option<EntityId>,

    name: Option<String>,
    title: Option<String>,
    project_name: Option<String>,

    case_id: Option<String>,
    project_case_id: Option<String>,

    description: Option<String>,
    project_description: Option<String>,

    address: Option<String>,
    project_address: Option<String>,

    #[serde(deserialize_with = "blank_as_none")]
    status: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    project_status: Option<String>,

    municipality_id: Option<EntityId>,
    municipality: Option<Municipality>,

    #[serde(deserialize_with = "lenient_date::deserialize")]
    due_date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_date::deserialize")]
    project_due_date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_date::deserialize")]
    status_due_date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_date::deserialize")]
    project_status_due_date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_date::deserialize")]
    start_date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_date::deserialize")]
    end_date: Option<NaiveDate>,

    permit_owner: Option<String>,
    permit_owner_name: Option<String>,
    permit_owner_data: Option<PermitOwner>,

    professionals: Option<Vec<AssignmentEntry>>,
    professional_associations: Option<Vec<ProjectProfessional>>,

    documents: Option<Vec<UploadedDocument>>,
    generated_documents: Option<Vec<GeneratedDocument>>,

    #[serde(deserialize_with = "lenient_datetime::deserialize")]
    created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_datetime::deserialize")]
    updated_at: Option<DateTime<Utc>>,
}

/// An entry of the `professionals` array: usually a bare professional,
/// occasionally a join row.
struct AssignmentEntry(ProjectProfessional);

impl<'de> Deserialize<'de> for AssignmentEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let is_join_row = ["professional", "pp_id", "project_professional_id"]
            .iter()
            .any(|key| value.get(key).is_some());
        let entry = if is_join_row {
            ProjectProfessional::deserialize(value).map_err(D::Error::custom)?
        } else {
            Professional::deserialize(value)
                .map(ProjectProfessional::from)
                .map_err(D::Error::custom)?
        };
        Ok(AssignmentEntry(entry))
    }
}

/// Merge the two assignment shapes; join rows come first, flat entries
/// are appended unless the same professional is already present.
fn merge_assignments(
    associations: Option<Vec<ProjectProfessional>>,
    flat: Option<Vec<AssignmentEntry>>,
) -> Vec<ProjectProfessional> {
    let mut merged = associations.unwrap_or_default();
    for AssignmentEntry(entry) in flat.unwrap_or_default() {
        let duplicate = entry.professional_id().is_some_and(|id| {
            merged
                .iter()
                .any(|existing| existing.professional_id() == Some(id))
        });
        if !duplicate {
            merged.push(entry);
        }
    }
    merged
}

impl From<RawProject> for Project {
    fn from(raw: RawProject) -> Self {
        let permit_owner = raw
            .permit_owner_data
            .and_then(|owner| owner.name)
            .or(raw.permit_owner)
            .or(raw.permit_owner_name);
        let municipality_id = raw
            .municipality_id
            .or_else(|| raw.municipality.as_ref().and_then(|m| m.id.clone()));

        Project {
            id: raw.id.or(raw.project_id),
            name: raw
                .name
                .or(raw.project_name)
                .or(raw.title)
                .unwrap_or_default(),
            case_id: raw.case_id.or(raw.project_case_id),
            description: raw.description.or(raw.project_description),
            address: raw.address.or(raw.project_address).unwrap_or_default(),
            status: raw
                .status
                .or(raw.project_status)
                .map(|s| ProjectStatus::parse(&s)),
            municipality_id,
            due_date: raw.due_date.or(raw.project_due_date),
            status_due_date: raw.status_due_date.or(raw.project_status_due_date),
            start_date: raw.start_date,
            end_date: raw.end_date,
            permit_owner,
            municipality: raw.municipality,
            professionals: merge_assignments(raw.professional_associations, raw.professionals),
            documents: raw.documents.unwrap_or_default(),
            generated_documents: raw.generated_documents.unwrap_or_default(),
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        }
    }
}

/// A professional chosen for a new project, keyed by its type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAssignment {
    pub professional_id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professional_type_id: Option<EntityId>,
}

/// Payload for `POST /project`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality_id: Option<EntityId>,
    #[serde(default, with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub status_due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub professionals: Vec<ProjectAssignment>,
}

/// Payload for `PUT /project`.
///
/// Assigned professionals and uploaded documents have their own endpoints
/// and are never part of an update. The permit owner collapses to a name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectUpdate {
    pub id: Option<EntityId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality_id: Option<EntityId>,
    #[serde(with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub status_due_date: Option<NaiveDate>,
    #[serde(with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permit_owner: Option<String>,
}

impl From<&Project> for ProjectUpdate {
    fn from(project: &Project) -> Self {
        ProjectUpdate {
            id: project.id.clone(),
            name: project.name.clone(),
            case_id: project.case_id.clone(),
            description: project.description.clone(),
            address: project.address.clone(),
            status: project.status.clone(),
            municipality_id: project.municipality_id.clone(),
            due_date: project.due_date,
            status_due_date: project.status_due_date,
            start_date: project.start_date,
            end_date: project.end_date,
            permit_owner: project.permit_owner.clone(),
        }
    }
}

/// Body of `POST`/`DELETE /project/professionals`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectProfessionalLink {
    pub project_id: EntityId,
    pub professional_id: EntityId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_backend_shape() {
        let json = r#"{
            "project_id": "p-1",
            "project_name": "Tower A",
            "project_case_id": "CASE-9",
            "project_address": "Main 5",
            "project_status": "Pre permit",
            "project_due_date": "2025-06-30",
            "created_at": "2025-01-01T08:00:00"
        }"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.id, Some(EntityId::from("p-1")));
        assert_eq!(project.name, "Tower A");
        assert_eq!(project.case_id.as_deref(), Some("CASE-9"));
        assert_eq!(project.status, Some(ProjectStatus::PrePermit));
        assert_eq!(project.due_date, NaiveDate::from_ymd_opt(2025, 6, 30));
        assert!(project.created_at.is_some());
    }

    #[test]
    fn test_flat_and_join_professionals_unify() {
        let flat: Project = serde_json::from_str(
            r#"{"id": 1, "name": "A", "address": "x",
                "professionals": [{"id": 10, "name": "Dana", "professional_type": "אדריכל"}]}"#,
        )
        .unwrap();
        let joined: Project = serde_json::from_str(
            r#"{"project_id": 1, "name": "A", "address": "x",
                "professional_associations": [
                    {"pp_id": 3, "professional_id": 10, "role": "architect",
                     "professional": {"professional_id": 10, "name": "Dana"}}
                ]}"#,
        )
        .unwrap();

        assert_eq!(flat.professional_ids(), vec![&EntityId::from(10)]);
        assert_eq!(joined.professional_ids(), vec![&EntityId::from(10)]);
        assert_eq!(flat.professionals[0].display_name(), "Dana");
        assert_eq!(joined.professionals[0].id, Some(EntityId::from(3)));
        assert!(joined.has_professional(&EntityId::from(10)));
    }

    #[test]
    fn test_both_shapes_do_not_duplicate() {
        let project: Project = serde_json::from_str(
            r#"{"id": 1, "name": "A", "address": "x",
                "professional_associations": [{"pp_id": 3, "professional_id": 10}],
                "professionals": [{"id": 10, "name": "Dana"}, {"id": 11, "name": "Eli"}]}"#,
        )
        .unwrap();
        assert_eq!(project.professionals.len(), 2);
    }

    #[test]
    fn test_update_strips_collections_and_resolves_owner() {
        let project: Project = serde_json::from_str(
            r#"{"id": "p", "name": "A", "address": "x",
                "permit_owner_name": "Legacy Owner",
                "permit_owner_data": {"name": "Owner Ltd"},
                "documents": [{"id": "d", "document_type": "כללי", "name": "a.pdf"}],
                "professionals": [{"id": 10, "name": "Dana"}]}"#,
        )
        .unwrap();
        let update = serde_json::to_value(project.to_update()).unwrap();
        assert_eq!(update["permit_owner"], "Owner Ltd");
        assert!(update.get("documents").is_none());
        assert!(update.get("professionals").is_none());
        assert!(update.get("permit_owner_data").is_none());

        let project: Project = serde_json::from_str(
            r#"{"id": "p", "name": "A", "address": "x", "permit_owner_name": "Legacy Owner"}"#,
        )
        .unwrap();
        assert_eq!(project.to_update().permit_owner.as_deref(), Some("Legacy Owner"));
    }

    #[test]
    fn test_canonical_encoding() {
        let project = Project {
            id: Some("p".into()),
            name: "Tower".into(),
            address: "Main 1".into(),
            status: Some(ProjectStatus::PostPermit),
            ..Default::default()
        };
        let value = serde_json::to_value(&project).unwrap();
        assert_eq!(value["status"], "POST_PERMIT");
        assert_eq!(value["name"], "Tower");
        assert!(value.get("project_name").is_none());

        let back: Project = serde_json::from_value(value).unwrap();
        assert_eq!(back, project);
    }

    #[test]
    fn test_blank_status_is_none() {
        let project: Project =
            serde_json::from_str(r#"{"id": 1, "name": "A", "address": "x", "status": ""}"#).unwrap();
        assert!(project.status.is_none());
    }
}
