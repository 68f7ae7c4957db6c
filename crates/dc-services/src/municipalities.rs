//! Municipality flows and the two-step municipality setup

use std::sync::Arc;

use dc_client::MunicipalitiesApi;
use dc_contracts::municipalities::{CreateMunicipalityContract, NewTemplateContract};
use dc_core::{DcResult, EntityId};
use dc_models::{DocumentTemplate, Municipality, NewMunicipality, NewTemplate};
use tracing::{debug, info, instrument};

use crate::base::ServiceContext;
use crate::list::EntityList;

pub const LIST_FAILED: &str = "Failed to load municipalities";
pub const CREATE_FAILED: &str = "Failed to create municipality. Please try again.";
pub const TEMPLATE_FAILED: &str = "Failed to add template. Please try again.";

pub struct MunicipalityService {
    api: Arc<dyn MunicipalitiesApi>,
    ctx: ServiceContext,
}

impl MunicipalityService {
    pub fn new(api: Arc<dyn MunicipalitiesApi>, ctx: ServiceContext) -> Self {
        Self { api, ctx }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> DcResult<EntityList<Municipality>> {
        let municipalities = self
            .ctx
            .report(self.api.list_municipalities().await, LIST_FAILED)?;
        Ok(EntityList::new(municipalities))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &EntityId) -> DcResult<Municipality> {
        self.ctx
            .report(self.api.get_municipality(id).await, "Failed to load municipality")
    }

    #[instrument(skip(self, list, municipality), fields(name = %municipality.name))]
    pub async fn create(
        &self,
        list: &mut EntityList<Municipality>,
        municipality: &NewMunicipality,
    ) -> DcResult<Municipality> {
        self.ctx
            .validate(&CreateMunicipalityContract::new(), municipality)?;
        let created = self.ctx.report(
            self.api.create_municipality(municipality).await,
            CREATE_FAILED,
        )?;
        self.ctx.success("Municipality created successfully");
        list.upsert(created.clone());
        Ok(created)
    }

    #[instrument(skip(self, list, municipality))]
    pub async fn update(
        &self,
        list: &mut EntityList<Municipality>,
        id: &EntityId,
        municipality: &NewMunicipality,
    ) -> DcResult<Municipality> {
        self.ctx
            .validate(&CreateMunicipalityContract::new(), municipality)?;
        let updated = self.ctx.report(
            self.api.update_municipality(id, municipality).await,
            "Failed to save changes",
        )?;
        self.ctx.success("Changes saved");
        list.upsert(updated.clone());
        Ok(updated)
    }

    #[instrument(skip(self, list))]
    pub async fn delete(
        &self,
        list: &mut EntityList<Municipality>,
        id: &EntityId,
    ) -> DcResult<()> {
        self.ctx.report(
            self.api.delete_municipality(id).await,
            "Failed to delete municipality",
        )?;
        list.remove(id);
        self.ctx.success("Municipality deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn templates(
        &self,
        municipality_id: Option<&EntityId>,
    ) -> DcResult<Vec<DocumentTemplate>> {
        self.ctx.report(
            self.api.list_templates(municipality_id).await,
            "Failed to load templates",
        )
    }

    /// Upload one template for an existing municipality
    #[instrument(skip(self, template), fields(name = %template.name))]
    pub async fn add_template(&self, template: &NewTemplate) -> DcResult<DocumentTemplate> {
        self.ctx.validate(&NewTemplateContract::new(), template)?;
        let created = self
            .ctx
            .report(self.api.create_template(template).await, TEMPLATE_FAILED)?;
        self.ctx.success("Template added successfully!");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn delete_template(&self, id: &EntityId) -> DcResult<()> {
        self.ctx.report(
            self.api.delete_template(id).await,
            "Failed to delete template",
        )?;
        self.ctx.success("Template deleted");
        Ok(())
    }

    /// Start a fresh create-then-add-templates run
    pub fn setup(&self) -> MunicipalitySetup {
        MunicipalitySetup::new(self.api.clone(), self.ctx.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    Details,
    Templates,
}

/// Create a municipality, then attach its templates one at a time
pub struct MunicipalitySetup {
    api: Arc<dyn MunicipalitiesApi>,
    ctx: ServiceContext,
    municipality: Option<Municipality>,
    added: Vec<DocumentTemplate>,
}

impl MunicipalitySetup {
    pub fn new(api: Arc<dyn MunicipalitiesApi>, ctx: ServiceContext) -> Self {
        Self {
            api,
            ctx,
            municipality: None,
            added: Vec::new(),
        }
    }

    pub fn step(&self) -> SetupStep {
        if self.municipality.is_some() {
            SetupStep::Templates
        } else {
            SetupStep::Details
        }
    }

    pub fn municipality(&self) -> Option<&Municipality> {
        self.municipality.as_ref()
    }

    pub fn added_templates(&self) -> &[DocumentTemplate] {
        &self.added
    }

    #[instrument(skip_all, fields(name = %data.name))]
    pub async fn create_municipality(&mut self, data: &NewMunicipality) -> DcResult<&Municipality> {
        self.ctx.validate(&CreateMunicipalityContract::new(), data)?;
        let created = self
            .ctx
            .report(self.api.create_municipality(data).await, CREATE_FAILED)?;
        info!(id = ?created.id, "Municipality created, awaiting templates");
        self.ctx
            .success("Municipality created successfully! Now add form templates.");
        Ok(self.municipality.insert(created))
    }

    /// The template is bound to the municipality created in the first step
    #[instrument(skip_all, fields(name = %template.name))]
    pub async fn add_template(&mut self, mut template: NewTemplate) -> DcResult<&DocumentTemplate> {
        template.municipality_id = self.municipality.as_ref().and_then(|m| m.id.clone());
        self.ctx.validate(&NewTemplateContract::new(), &template)?;

        let created = self
            .ctx
            .report(self.api.create_template(&template).await, TEMPLATE_FAILED)?;
        debug!(count = self.added.len() + 1, "Template added");
        self.ctx.success("Template added successfully!");
        self.added.push(created);
        Ok(&self.added[self.added.len() - 1])
    }

    /// Close the run and start over. Returns what was created.
    pub fn finish(&mut self) -> Option<(Municipality, Vec<DocumentTemplate>)> {
        let municipality = self.municipality.take()?;
        let templates = std::mem::take(&mut self.added);
        self.ctx
            .success("Municipality and templates have been created successfully!");
        Some((municipality, templates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::CollectingNotifier;
    use dc_client::MemoryApi;
    use dc_contracts::municipalities::{MUNICIPALITY_MISSING, NAME_REQUIRED};
    use dc_models::UploadFile;

    fn service() -> (MunicipalityService, Arc<MemoryApi>, Arc<CollectingNotifier>) {
        let api = Arc::new(MemoryApi::seeded());
        let notifier = CollectingNotifier::shared();
        let service = MunicipalityService::new(api.clone(), ServiceContext::new(notifier.clone()));
        (service, api, notifier)
    }

    fn template(name: &str) -> NewTemplate {
        NewTemplate {
            name: name.into(),
            professional_type_id: Some(EntityId::from(1)),
            required_fields: vec!["license_number".into()],
            file: Some(UploadFile::from_bytes("form.docx", b"PK\x03\x04".to_vec())),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_setup_runs_both_steps() {
        let (service, api, notifier) = service();
        let mut setup = service.setup();
        assert_eq!(setup.step(), SetupStep::Details);

        let data = NewMunicipality {
            name: "Beersheba".into(),
            ..Default::default()
        };
        let id = setup.create_municipality(&data).await.unwrap().id.clone().unwrap();
        assert_eq!(setup.step(), SetupStep::Templates);

        setup.add_template(template("Contractor appointment")).await.unwrap();
        setup.add_template(template("Waste supervision")).await.unwrap();
        assert_eq!(setup.added_templates().len(), 2);
        assert!(setup
            .added_templates()
            .iter()
            .all(|t| t.municipality_id.as_ref() == Some(&id)));

        let (municipality, templates) = setup.finish().unwrap();
        assert_eq!(municipality.name, "Beersheba");
        assert_eq!(templates.len(), 2);
        assert_eq!(setup.step(), SetupStep::Details);
        assert_eq!(api.call_count("create_template"), 2);
        assert_eq!(
            notifier.last().unwrap().message,
            "Municipality and templates have been created successfully!"
        );
    }

    #[tokio::test]
    async fn test_template_before_municipality_is_blocked() {
        let (service, api, notifier) = service();
        let mut setup = service.setup();

        assert!(setup.add_template(template("Orphan")).await.is_err());
        assert_eq!(api.call_count("create_template"), 0);
        assert_eq!(notifier.last().unwrap().message, MUNICIPALITY_MISSING);
        assert!(setup.finish().is_none());
    }

    #[tokio::test]
    async fn test_blank_name_is_blocked() {
        let (service, api, notifier) = service();
        let mut list = service.list().await.unwrap();

        assert!(service
            .create(&mut list, &NewMunicipality::default())
            .await
            .is_err());
        assert_eq!(api.call_count("create_municipality"), 0);
        assert_eq!(notifier.last().unwrap().message, NAME_REQUIRED);
    }

    #[tokio::test]
    async fn test_create_failure_uses_fallback() {
        let (service, api, notifier) = service();
        let mut setup = service.setup();
        api.fail_on("create_municipality", 502, "");

        let data = NewMunicipality {
            name: "Eilat".into(),
            ..Default::default()
        };
        assert!(setup.create_municipality(&data).await.is_err());
        assert_eq!(setup.step(), SetupStep::Details);
        assert_eq!(
            notifier.last().unwrap().message,
            "Failed to create municipality. Please try again. [Status: 502]"
        );
    }

    #[tokio::test]
    async fn test_update_and_delete_sync_list() {
        let (service, _api, _) = service();
        let mut list = service.list().await.unwrap();
        let first = list.items()[0].clone();
        let id = first.id.clone().unwrap();

        let mut data = first.to_update();
        data.website = Some("https://tlv.example".into());
        service.update(&mut list, &id, &data).await.unwrap();
        assert_eq!(
            list.get(&id).unwrap().website.as_deref(),
            Some("https://tlv.example")
        );

        let templates = service.templates(Some(&id)).await.unwrap();
        assert_eq!(templates.len(), 3);

        service.delete(&mut list, &id).await.unwrap();
        assert!(!list.contains(&id));
        assert!(service.templates(Some(&id)).await.unwrap().is_empty());
    }
}
