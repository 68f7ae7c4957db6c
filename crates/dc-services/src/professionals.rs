//! Professional flows

use std::sync::Arc;

use dc_client::ProfessionalsApi;
use dc_contracts::professionals::{CreateProfessionalContract, UpdateProfessionalContract};
use dc_core::{DcResult, EntityId};
use dc_models::{NewProfessional, Professional, ProfessionalStatus, ProfessionalType, UploadFile};
use serde::Serialize;
use tracing::{info, instrument};

use crate::base::ServiceContext;
use crate::list::EntityList;

pub const LIST_FAILED: &str = "Failed to load professionals";
pub const CREATE_FAILED: &str = "Failed to create professional";
pub const UPDATE_FAILED: &str = "Failed to save changes";
pub const DELETE_FAILED: &str = "Failed to delete professional";
pub const IMPORT_FAILED: &str = "Failed to import professional data";

/// Professionals sharing one type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfessionalGroup {
    pub professional_type: Option<ProfessionalType>,
    pub members: Vec<Professional>,
}

impl ProfessionalGroup {
    pub fn label(&self) -> &str {
        self.professional_type
            .as_ref()
            .map(|t| t.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("Unassigned")
    }
}

/// Group by type in the order types are first seen; members keep their
/// order. Professionals without a type share one group.
pub fn group_by_type(professionals: &[Professional]) -> Vec<ProfessionalGroup> {
    let mut groups: Vec<(Option<String>, ProfessionalGroup)> = Vec::new();
    for professional in professionals {
        let key = professional.professional_type.as_ref().map(ProfessionalType::key);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, group)) => group.members.push(professional.clone()),
            None => groups.push((
                key,
                ProfessionalGroup {
                    professional_type: professional.professional_type.clone(),
                    members: vec![professional.clone()],
                },
            )),
        }
    }
    groups.into_iter().map(|(_, group)| group).collect()
}

pub struct ProfessionalService {
    api: Arc<dyn ProfessionalsApi>,
    ctx: ServiceContext,
}

impl ProfessionalService {
    pub fn new(api: Arc<dyn ProfessionalsApi>, ctx: ServiceContext) -> Self {
        Self { api, ctx }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> DcResult<EntityList<Professional>> {
        let professionals = self
            .ctx
            .report(self.api.list_professionals().await, LIST_FAILED)?;
        Ok(EntityList::new(professionals))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &EntityId) -> DcResult<Professional> {
        self.ctx
            .report(self.api.get_professional(id).await, "Failed to load professional")
    }

    #[instrument(skip(self))]
    pub async fn types(&self) -> DcResult<Vec<ProfessionalType>> {
        self.ctx.report(
            self.api.professional_types().await,
            "Failed to load professional types",
        )
    }

    #[instrument(skip(self))]
    pub async fn statuses(&self) -> DcResult<Vec<ProfessionalStatus>> {
        self.ctx.report(
            self.api.professional_statuses().await,
            "Failed to load professional statuses",
        )
    }

    #[instrument(skip(self, list, professional), fields(name = %professional.name))]
    pub async fn create(
        &self,
        list: &mut EntityList<Professional>,
        professional: &NewProfessional,
    ) -> DcResult<Professional> {
        self.ctx
            .validate(&CreateProfessionalContract::new(), professional)?;

        let created = self.ctx.report(
            self.api.create_professional(professional).await,
            CREATE_FAILED,
        )?;
        info!(id = ?created.id, "Professional created");
        self.ctx.success("Professional created successfully");
        list.upsert(created.clone());
        Ok(created)
    }

    #[instrument(skip_all, fields(id = ?professional.id))]
    pub async fn update(
        &self,
        list: &mut EntityList<Professional>,
        professional: &Professional,
    ) -> DcResult<Professional> {
        self.ctx
            .validate(&UpdateProfessionalContract::new(), professional)?;

        let updated = self.ctx.report(
            self.api.update_professional(&professional.to_update()).await,
            UPDATE_FAILED,
        )?;
        self.ctx.success("Changes saved");
        list.upsert(updated.clone());
        Ok(updated)
    }

    #[instrument(skip(self, list))]
    pub async fn delete(
        &self,
        list: &mut EntityList<Professional>,
        id: &EntityId,
    ) -> DcResult<()> {
        self.ctx
            .report(self.api.delete_professional(id).await, DELETE_FAILED)?;
        list.remove(id);
        self.ctx.success("Professional deleted");
        Ok(())
    }

    /// Prefill a creation form from a scanned license. The type is mapped
    /// onto a known professional type and the draft is not saved.
    #[instrument(skip(self, file), fields(file = %file.file_name))]
    pub async fn import(&self, file: UploadFile) -> DcResult<NewProfessional> {
        let mut draft = self
            .ctx
            .report(self.api.import_professional(file).await, IMPORT_FAILED)?;
        if !draft.professional_type.trim().is_empty() {
            draft.professional_type = ProfessionalType::classify(&draft.professional_type);
        }
        self.ctx.info("License data imported. Review before saving.");
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::CollectingNotifier;
    use dc_client::MemoryApi;
    use dc_core::DcError;

    fn service() -> (ProfessionalService, Arc<MemoryApi>, Arc<CollectingNotifier>) {
        let api = Arc::new(MemoryApi::seeded());
        let notifier = CollectingNotifier::shared();
        let service = ProfessionalService::new(api.clone(), ServiceContext::new(notifier.clone()));
        (service, api, notifier)
    }

    fn of_type(id: &str, type_id: i64, type_name: &str) -> Professional {
        Professional {
            id: Some(EntityId::from(id)),
            name: id.to_uppercase(),
            professional_type: Some(ProfessionalType::with_id(type_id, type_name)),
            ..Default::default()
        }
    }

    #[test]
    fn test_group_by_type_first_seen_order() {
        let professionals = vec![
            of_type("a", 3, "Architect"),
            of_type("b", 1, "Engineer"),
            of_type("c", 3, "Architect"),
            Professional {
                id: Some(EntityId::from("d")),
                ..Default::default()
            },
            of_type("e", 1, "Engineer"),
        ];

        let groups = group_by_type(&professionals);
        let labels: Vec<&str> = groups.iter().map(ProfessionalGroup::label).collect();
        assert_eq!(labels, vec!["Architect", "Engineer", "Unassigned"]);

        let architects: Vec<&str> = groups[0].members.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(architects, vec!["A", "C"]);
        assert_eq!(groups[1].members.len(), 2);
    }

    #[tokio::test]
    async fn test_create_requires_every_field() {
        let (service, api, notifier) = service();
        let mut list = EntityList::default();

        let draft = NewProfessional {
            name: "Noa Shalev".into(),
            ..Default::default()
        };
        assert!(matches!(
            service.create(&mut list, &draft).await,
            Err(DcError::Validation(_))
        ));
        assert_eq!(api.call_count("create_professional"), 0);
        assert_eq!(notifier.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let (service, api, _) = service();
        let mut list = service.list().await.unwrap();
        let before = list.len();

        let draft = NewProfessional {
            name: "Noa Shalev".into(),
            address: "Ben Yehuda 5, Tel Aviv".into(),
            phone: "0501112222".into(),
            email: "noa@shalev.example".into(),
            professional_type: "אדריכל".into(),
            national_id: "123456782".into(),
            license_number: "L-77".into(),
            license_expiration_date: "2030-01-31".into(),
        };
        let created = service.create(&mut list, &draft).await.unwrap();
        assert_eq!(created.type_name(), Some("אדריכל"));
        assert_eq!(list.len(), before + 1);

        let id = created.id.unwrap();
        service.delete(&mut list, &id).await.unwrap();
        assert_eq!(list.len(), before);
        assert_eq!(api.call_count("delete_professional"), 1);
    }

    #[tokio::test]
    async fn test_update_rejects_bad_email() {
        let (service, api, _) = service();
        let mut list = service.list().await.unwrap();
        let mut professional = list.items()[0].clone();
        professional.email = Some("not-an-email".into());

        assert!(service.update(&mut list, &professional).await.is_err());
        assert_eq!(api.call_count("update_professional"), 0);

        professional.email = Some("dana@levi.example".into());
        let updated = service.update(&mut list, &professional).await.unwrap();
        assert_eq!(updated.email.as_deref(), Some("dana@levi.example"));
    }

    #[tokio::test]
    async fn test_import_prefills_from_file() {
        let (service, _api, notifier) = service();
        let draft = service
            .import(UploadFile::from_bytes("avi_peretz.pdf", b"%PDF-1.4".to_vec()))
            .await
            .unwrap();
        assert_eq!(draft.name, "avi peretz");
        assert_eq!(notifier.notices().len(), 1);

        let err = service
            .import(UploadFile::from_bytes("empty.pdf", Vec::<u8>::new()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(
            notifier.last().unwrap().message,
            "No file provided [Status: 400]"
        );
    }
}
