//! The five-step project creation wizard
//!
//! [`ProjectWizard`] is pure state: the form, the current step and the
//! catalogs the steps pick from. Moving forward runs the contract of the
//! step being left. Moving back is always allowed except from the first
//! step. [`WizardService`] does the backend work: loading the catalogs,
//! reloading templates when the municipality changes, the submit that
//! creates the project and its documents, and the uploads on review.

use std::sync::Arc;

use dc_client::{Backend, DocumentsApi, MunicipalitiesApi, ProfessionalsApi, ProjectsApi};
use dc_contracts::wizard::{WizardForm, WizardStep, WizardStepContract};
use dc_contracts::Contract;
use dc_core::{DcError, DcResult, EntityId, ValidationErrors};
use dc_models::{
    DocumentStatus, DocumentTemplate, GenerateDocument, GeneratedDocument, Municipality,
    Professional, Project, UploadFile,
};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::base::ServiceContext;
use crate::professionals::{group_by_type, ProfessionalGroup};

pub const LOAD_FAILED: &str = "Failed to load data. Please try again.";
pub const TEMPLATES_FAILED: &str = "Failed to load templates";
pub const SUBMIT_FAILED: &str = "Failed to create project and generate documents.";
pub const UPLOAD_FAILED: &str = "Failed to upload document.";

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("{0}")]
    Invalid(ValidationErrors),

    #[error("There is no step before {0}")]
    NoPrevious(WizardStep),

    #[error("There is no step after {0}")]
    NoNext(WizardStep),

    #[error("Generate the documents before continuing.")]
    NotSubmitted,

    #[error("The project has already been created.")]
    AlreadySubmitted,

    #[error("Documents can only be generated from step {}", WizardStep::GenerateDocuments.number())]
    WrongStep(WizardStep),
}

impl From<WizardError> for DcError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::Invalid(errors) => DcError::Validation(errors),
            other => {
                let mut errors = ValidationErrors::new();
                errors.add_base(other.to_string());
                DcError::Validation(errors)
            }
        }
    }
}

/// Wizard state. Nothing here survives the process.
#[derive(Debug, Clone)]
pub struct ProjectWizard {
    step: WizardStep,
    form: WizardForm,
    professionals: Vec<Professional>,
    municipalities: Vec<Municipality>,
    templates: Vec<DocumentTemplate>,
    project: Option<Project>,
    generated: Vec<GeneratedDocument>,
}

impl ProjectWizard {
    pub fn new(professionals: Vec<Professional>, municipalities: Vec<Municipality>) -> Self {
        Self {
            step: WizardStep::BasicInfo,
            form: WizardForm::default(),
            professionals,
            municipalities,
            templates: Vec::new(),
            project: None,
            generated: Vec::new(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn form(&self) -> &WizardForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut WizardForm {
        &mut self.form
    }

    pub fn professionals(&self) -> &[Professional] {
        &self.professionals
    }

    pub fn professional_groups(&self) -> Vec<ProfessionalGroup> {
        group_by_type(&self.professionals)
    }

    pub fn municipalities(&self) -> &[Municipality] {
        &self.municipalities
    }

    /// Templates of the selected municipality
    pub fn templates(&self) -> &[DocumentTemplate] {
        &self.templates
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn generated(&self) -> &[GeneratedDocument] {
        &self.generated
    }

    pub fn is_submitted(&self) -> bool {
        self.project.is_some() && self.pending_templates().is_empty()
    }

    /// Selected templates without a generated document yet
    fn pending_templates(&self) -> Vec<EntityId> {
        self.form
            .selected_templates
            .iter()
            .filter(|id| {
                !self
                    .generated
                    .iter()
                    .any(|g| g.template_id.as_ref() == Some(*id))
            })
            .cloned()
            .collect()
    }

    /// The professional becomes the choice for its type
    pub fn select_professional(&mut self, professional: &Professional) {
        let Some(id) = professional.id.clone() else {
            return;
        };
        let type_id = professional
            .professional_type
            .as_ref()
            .and_then(|t| t.id.clone());
        self.form.select_professional(type_id, id);
    }

    pub fn selected_professional(&self, professional_type_id: Option<&EntityId>) -> Option<&Professional> {
        let assignment = self
            .form
            .professionals
            .iter()
            .find(|a| a.professional_type_id.as_ref() == professional_type_id)?;
        self.professionals
            .iter()
            .find(|p| p.id.as_ref() == Some(&assignment.professional_id))
    }

    pub fn toggle_template(&mut self, template_id: EntityId) -> bool {
        self.form.toggle_template(template_id)
    }

    /// Selecting another municipality drops the template choices
    pub fn set_municipality(&mut self, municipality_id: EntityId, templates: Vec<DocumentTemplate>) {
        if self.form.municipality_id.as_ref() != Some(&municipality_id) {
            self.form.selected_templates.clear();
        }
        self.form.municipality_id = Some(municipality_id);
        self.templates = templates;
    }

    pub fn check(&self, step: WizardStep) -> Result<(), WizardError> {
        WizardStepContract::new(step)
            .validate(&self.form)
            .map_err(WizardError::Invalid)
    }

    /// Leave the current step if its contract passes. Leaving the
    /// generation step also needs a finished submit.
    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        let next = self.step.next().ok_or(WizardError::NoNext(self.step))?;
        self.check(self.step)?;
        if self.step == WizardStep::GenerateDocuments && !self.is_submitted() {
            return Err(WizardError::NotSubmitted);
        }
        self.step = next;
        Ok(next)
    }

    pub fn previous(&mut self) -> Result<WizardStep, WizardError> {
        let previous = self
            .step
            .previous()
            .ok_or(WizardError::NoPrevious(self.step))?;
        self.step = previous;
        Ok(previous)
    }

    /// Start over with the same catalogs
    pub fn reset(&mut self) {
        self.step = WizardStep::BasicInfo;
        self.form = WizardForm::default();
        self.templates.clear();
        self.project = None;
        self.generated.clear();
    }
}

pub struct WizardService {
    projects: Arc<dyn ProjectsApi>,
    professionals: Arc<dyn ProfessionalsApi>,
    municipalities: Arc<dyn MunicipalitiesApi>,
    documents: Arc<dyn DocumentsApi>,
    ctx: ServiceContext,
}

impl WizardService {
    pub fn new(backend: &Backend, ctx: ServiceContext) -> Self {
        Self {
            projects: backend.projects.clone(),
            professionals: backend.professionals.clone(),
            municipalities: backend.municipalities.clone(),
            documents: backend.documents.clone(),
            ctx,
        }
    }

    /// A fresh wizard with professionals and municipalities loaded
    #[instrument(skip(self))]
    pub async fn start(&self) -> DcResult<ProjectWizard> {
        let loaded = futures::try_join!(
            self.professionals.list_professionals(),
            self.municipalities.list_municipalities(),
        );
        let (professionals, municipalities) = self.ctx.report(loaded, LOAD_FAILED)?;
        debug!(
            professionals = professionals.len(),
            municipalities = municipalities.len(),
            "Wizard catalogs loaded"
        );
        Ok(ProjectWizard::new(professionals, municipalities))
    }

    #[instrument(skip(self, wizard))]
    pub async fn select_municipality(
        &self,
        wizard: &mut ProjectWizard,
        municipality_id: &EntityId,
    ) -> DcResult<()> {
        let templates = self.ctx.report(
            self.municipalities.list_templates(Some(municipality_id)).await,
            TEMPLATES_FAILED,
        )?;
        wizard.set_municipality(municipality_id.clone(), templates);
        Ok(())
    }

    /// Move forward, reporting why not when blocked
    pub fn next(&self, wizard: &mut ProjectWizard) -> DcResult<WizardStep> {
        wizard.next().map_err(|err| self.reject(err))
    }

    pub fn previous(&self, wizard: &mut ProjectWizard) -> DcResult<WizardStep> {
        wizard.previous().map_err(|err| self.reject(err))
    }

    fn reject(&self, err: WizardError) -> DcError {
        self.ctx.fail(err.into(), "Invalid wizard step")
    }

    /// Create the project, generate one document per selected template and
    /// move to review.
    ///
    /// A submit that already went through is refused. After a partial
    /// failure the project is not created twice: only the templates still
    /// missing a document are generated.
    #[instrument(skip_all, fields(name = %wizard.form.name))]
    pub async fn submit<'a>(
        &self,
        wizard: &'a mut ProjectWizard,
    ) -> DcResult<&'a [GeneratedDocument]> {
        if wizard.is_submitted() {
            return Err(self.reject(WizardError::AlreadySubmitted));
        }
        if wizard.step != WizardStep::GenerateDocuments {
            return Err(self.reject(WizardError::WrongStep(wizard.step)));
        }
        for step in &WizardStep::ALL[..WizardStep::GenerateDocuments.number() as usize] {
            wizard.check(*step).map_err(|err| self.reject(err))?;
        }

        let project_id = match wizard.project.as_ref().and_then(|p| p.id.clone()) {
            Some(id) => id,
            None => {
                let created = self.ctx.report(
                    self.projects.create_project(&wizard.form.to_new_project()).await,
                    SUBMIT_FAILED,
                )?;
                info!(id = ?created.id, "Wizard project created");
                let id = created
                    .id
                    .clone()
                    .ok_or_else(|| self.ctx.fail(DcError::not_found("project", "<unsaved>"), SUBMIT_FAILED))?;
                wizard.project = Some(created);
                id
            }
        };

        for template_id in wizard.pending_templates() {
            let request = GenerateDocument {
                project_id: project_id.clone(),
                template_id,
            };
            let mut generated = self.ctx.report(
                self.documents.generate_document(&request).await,
                SUBMIT_FAILED,
            )?;
            // The backend may answer with the document id alone
            generated
                .template_id
                .get_or_insert_with(|| request.template_id.clone());
            generated
                .project_id
                .get_or_insert_with(|| project_id.clone());
            debug!(id = ?generated.id, template = %request.template_id, "Document generated");
            wizard.generated.push(generated);
        }

        wizard.step = WizardStep::Review;
        self.ctx
            .success("Project created and documents generated successfully!");
        Ok(&wizard.generated)
    }

    /// Upload the filled-in file for one generated document
    #[instrument(skip(self, wizard, file), fields(file = %file.file_name))]
    pub async fn upload_document(
        &self,
        wizard: &mut ProjectWizard,
        document_id: &EntityId,
        file: UploadFile,
    ) -> DcResult<()> {
        let Some(index) = wizard
            .generated
            .iter()
            .position(|g| g.id.as_ref() == Some(document_id))
        else {
            return Err(self
                .ctx
                .fail(DcError::not_found("generated document", document_id), UPLOAD_FAILED));
        };

        self.ctx.report(
            self.documents.upload_generated_document(document_id, file).await,
            UPLOAD_FAILED,
        )?;
        wizard.generated[index].status = Some(DocumentStatus::Uploaded);
        self.ctx.success("Document uploaded successfully!");
        Ok(())
    }
}
