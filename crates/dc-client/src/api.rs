//! Resource traits
//!
//! One trait per backend area so each flow depends on exactly the calls it
//! makes. [`Backend`] bundles one implementation behind every trait.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dc_auth::AuthBackend;
use dc_core::{DcResult, EntityId};
use dc_models::{
    DocumentTemplate, DocumentUpload, GenerateDocument, GeneratedDocument, ManagedUser,
    Municipality, NewMunicipality, NewProfessional, NewProject, NewTemplate, NewUser,
    Professional, ProfessionalStatus, ProfessionalType, Project, ProjectProfessionalLink,
    ProjectStatus, ProjectUpdate, SegmentHit, SurveyQuestionHit, UploadFile,
};

/// A file fetched from the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl DownloadedFile {
    pub fn is_pdf(&self) -> bool {
        self.content_type == "application/pdf" || dc_models::is_pdf_name(&self.file_name)
    }
}

#[async_trait]
pub trait ProjectsApi: Send + Sync {
    async fn list_projects(&self) -> DcResult<Vec<Project>>;

    async fn get_project(&self, id: &EntityId) -> DcResult<Project>;

    async fn create_project(&self, project: &NewProject) -> DcResult<Project>;

    async fn update_project(&self, update: &ProjectUpdate) -> DcResult<Project>;

    async fn delete_project(&self, id: &EntityId) -> DcResult<()>;

    async fn project_statuses(&self) -> DcResult<Vec<ProjectStatus>>;

    async fn attach_professional(&self, link: &ProjectProfessionalLink) -> DcResult<()>;

    async fn detach_professional(&self, link: &ProjectProfessionalLink) -> DcResult<()>;

    async fn upload_project_document(
        &self,
        project_id: &EntityId,
        upload: DocumentUpload,
    ) -> DcResult<()>;

    async fn download_project_document(
        &self,
        project_id: &EntityId,
        document_id: &EntityId,
    ) -> DcResult<DownloadedFile>;

    async fn delete_project_document(
        &self,
        project_id: &EntityId,
        document_id: &EntityId,
    ) -> DcResult<()>;

    async fn project_document_types(&self) -> DcResult<Vec<String>>;
}

#[async_trait]
pub trait ProfessionalsApi: Send + Sync {
    async fn list_professionals(&self) -> DcResult<Vec<Professional>>;

    async fn get_professional(&self, id: &EntityId) -> DcResult<Professional>;

    async fn create_professional(&self, professional: &NewProfessional) -> DcResult<Professional>;

    async fn update_professional(&self, professional: &Professional) -> DcResult<Professional>;

    async fn delete_professional(&self, id: &EntityId) -> DcResult<()>;

    async fn professional_types(&self) -> DcResult<Vec<ProfessionalType>>;

    async fn professional_statuses(&self) -> DcResult<Vec<ProfessionalStatus>>;

    async fn upload_professional_document(
        &self,
        professional_id: &EntityId,
        upload: DocumentUpload,
    ) -> DcResult<()>;

    async fn download_professional_document(
        &self,
        professional_id: &EntityId,
        document_id: &EntityId,
    ) -> DcResult<DownloadedFile>;

    async fn delete_professional_document(
        &self,
        professional_id: &EntityId,
        document_id: &EntityId,
    ) -> DcResult<()>;

    async fn professional_document_types(&self) -> DcResult<Vec<String>>;

    /// Extract professional details from a scanned license
    async fn import_professional(&self, file: UploadFile) -> DcResult<NewProfessional>;
}

#[async_trait]
pub trait MunicipalitiesApi: Send + Sync {
    async fn list_municipalities(&self) -> DcResult<Vec<Municipality>>;

    async fn get_municipality(&self, id: &EntityId) -> DcResult<Municipality>;

    async fn create_municipality(&self, municipality: &NewMunicipality) -> DcResult<Municipality>;

    async fn update_municipality(
        &self,
        id: &EntityId,
        municipality: &NewMunicipality,
    ) -> DcResult<Municipality>;

    async fn delete_municipality(&self, id: &EntityId) -> DcResult<()>;

    /// Templates, optionally restricted to one municipality
    async fn list_templates(
        &self,
        municipality_id: Option<&EntityId>,
    ) -> DcResult<Vec<DocumentTemplate>>;

    async fn create_template(&self, template: &NewTemplate) -> DcResult<DocumentTemplate>;

    async fn delete_template(&self, id: &EntityId) -> DcResult<()>;
}

#[async_trait]
pub trait DocumentsApi: Send + Sync {
    async fn generate_document(&self, request: &GenerateDocument) -> DcResult<GeneratedDocument>;

    async fn upload_generated_document(
        &self,
        document_id: &EntityId,
        file: UploadFile,
    ) -> DcResult<()>;
}

#[async_trait]
pub trait UsersApi: Send + Sync {
    async fn list_users(&self) -> DcResult<Vec<ManagedUser>>;

    async fn create_user(&self, user: &NewUser) -> DcResult<ManagedUser>;

    async fn delete_user(&self, id: &EntityId) -> DcResult<()>;
}

#[async_trait]
pub trait SurveyApi: Send + Sync {
    async fn search_questions(&self, query: &str, threshold: f64)
        -> DcResult<Vec<SurveyQuestionHit>>;

    async fn search_segments(&self) -> DcResult<Vec<SegmentHit>>;
}

/// Everything the backend offers
pub trait DocConstructApi:
    AuthBackend + ProjectsApi + ProfessionalsApi + MunicipalitiesApi + DocumentsApi + UsersApi + SurveyApi
{
}

impl<T> DocConstructApi for T where
    T: AuthBackend
        + ProjectsApi
        + ProfessionalsApi
        + MunicipalitiesApi
        + DocumentsApi
        + UsersApi
        + SurveyApi
{
}

/// One backend seen through each resource trait
#[derive(Clone)]
pub struct Backend {
    pub auth: Arc<dyn AuthBackend>,
    pub projects: Arc<dyn ProjectsApi>,
    pub professionals: Arc<dyn ProfessionalsApi>,
    pub municipalities: Arc<dyn MunicipalitiesApi>,
    pub documents: Arc<dyn DocumentsApi>,
    pub users: Arc<dyn UsersApi>,
    pub survey: Arc<dyn SurveyApi>,
}

impl Backend {
    pub fn new<A>(api: Arc<A>) -> Self
    where
        A: DocConstructApi + 'static,
    {
        Self {
            auth: api.clone(),
            projects: api.clone(),
            professionals: api.clone(),
            municipalities: api.clone(),
            documents: api.clone(),
            users: api.clone(),
            survey: api,
        }
    }
}
