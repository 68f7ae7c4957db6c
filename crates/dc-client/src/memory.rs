//! In-process backend for tests and offline runs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use dc_auth::{AuthBackend, SessionStore};
use dc_core::types::lenient_date;
use dc_core::{DcError, DcResult, EntityId};
use dc_models::{
    DocumentStatus, DocumentTemplate, DocumentUpload, GenerateDocument, GeneratedDocument,
    LoginRequest, LoginResponse, ManagedUser, Municipality, NewMunicipality, NewProfessional,
    NewProject, NewTemplate, NewUser, PasswordChange, Professional, ProfessionalStatus,
    ProfessionalType, Project, ProjectProfessional, ProjectProfessionalLink, ProjectStatus,
    ProjectUpdate, SegmentHit, StoredFile, SurveyQuestionHit, SurveyRef, UploadFile,
    UploadedDocument, UserProfile, KNOWN_PROFESSIONAL_TYPES, PROFESSIONAL_DOCUMENT_TYPES,
    PROJECT_DOCUMENT_TYPES,
};
use parking_lot::RwLock;
use tracing::debug;

use crate::api::*;
use crate::error::{ApiError, ErrorBody};

const TOKEN_PREFIX: &str = "mem";

struct Account {
    user: ManagedUser,
    password: String,
}

#[derive(Default)]
struct State {
    next_id: u64,
    projects: Vec<Project>,
    professionals: Vec<Professional>,
    municipalities: Vec<Municipality>,
    templates: Vec<DocumentTemplate>,
    files: HashMap<EntityId, DownloadedFile>,
    accounts: Vec<Account>,
    statuses: Vec<ProjectStatus>,
    types: Vec<ProfessionalType>,
    questions: Vec<SurveyQuestionHit>,
    segments: Vec<SegmentHit>,
    calls: Vec<String>,
    failures: HashMap<String, (u16, String)>,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> EntityId {
        self.next_id += 1;
        EntityId::new(format!("{prefix}-{}", self.next_id))
    }

    fn project_mut(&mut self, id: &EntityId) -> DcResult<&mut Project> {
        self.projects
            .iter_mut()
            .find(|p| p.id.as_ref() == Some(id))
            .ok_or_else(|| DcError::not_found("project", id))
    }

    fn professional(&self, id: &EntityId) -> DcResult<&Professional> {
        self.professionals
            .iter()
            .find(|p| p.id.as_ref() == Some(id))
            .ok_or_else(|| DcError::not_found("professional", id))
    }

    fn professional_mut(&mut self, id: &EntityId) -> DcResult<&mut Professional> {
        self.professionals
            .iter_mut()
            .find(|p| p.id.as_ref() == Some(id))
            .ok_or_else(|| DcError::not_found("professional", id))
    }

    fn resolve_type(&self, name: &str) -> ProfessionalType {
        self.types
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .unwrap_or_else(|| ProfessionalType::named(name))
    }

    fn store_file(&mut self, document_id: &EntityId, file: &UploadFile) -> StoredFile {
        self.files.insert(
            document_id.clone(),
            DownloadedFile {
                file_name: file.file_name.clone(),
                content_type: file.content_type.clone(),
                data: file.data.clone(),
            },
        );
        StoredFile {
            id: Some(document_id.clone()),
            file_name: file.file_name.clone(),
            file_type: Some(file.content_type.clone()),
            file_size: Some(file.len() as u64),
            ..StoredFile::default()
        }
    }

    fn account_for_token(&self, token: Option<String>) -> DcResult<&Account> {
        let email = token
            .as_deref()
            .and_then(|t| t.strip_prefix(TOKEN_PREFIX))
            .and_then(|t| t.strip_prefix(':'))
            .and_then(|t| t.rsplit_once(':'))
            .map(|(email, _)| email.to_string());
        email
            .and_then(|email| self.accounts.iter().find(|a| a.user.email == email))
            .ok_or_else(|| DcError::Unauthorized {
                message: "Invalid or expired token".to_string(),
            })
    }
}

/// Backend kept entirely in memory.
///
/// Every call is recorded by operation name, and any operation can be made
/// to fail with [`MemoryApi::fail_on`].
pub struct MemoryApi {
    state: RwLock<State>,
    session: Option<Arc<dyn SessionStore>>,
}

impl Default for MemoryApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryApi {
    /// An empty backend that still knows the standard catalogs
    pub fn new() -> Self {
        let state = State {
            statuses: ProjectStatus::KNOWN.to_vec(),
            types: KNOWN_PROFESSIONAL_TYPES
                .iter()
                .enumerate()
                .map(|(i, name)| ProfessionalType::with_id((i + 1) as i64, *name))
                .collect(),
            ..State::default()
        };
        Self {
            state: RwLock::new(state),
            session: None,
        }
    }

    /// Read the bearer token from `session` for profile checks
    pub fn with_session(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_account(self, email: &str, password: &str, roles: &[&str]) -> Self {
        {
            let mut state = self.state.write();
            let id = state.next_id("u");
            state.accounts.push(Account {
                user: ManagedUser {
                    id: Some(id),
                    email: email.to_string(),
                    roles: roles.iter().map(|r| r.to_string()).collect(),
                    created_at: Some(Utc::now()),
                },
                password: password.to_string(),
            });
        }
        self
    }

    /// Make `operation` fail with `status` and `message` until cleared
    pub fn fail_on(&self, operation: &str, status: u16, message: &str) {
        self.state
            .write()
            .failures
            .insert(operation.to_string(), (status, message.to_string()));
    }

    pub fn clear_failures(&self) {
        self.state.write().failures.clear();
    }

    /// Operation names in call order
    pub fn calls(&self) -> Vec<String> {
        self.state.read().calls.clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.state
            .read()
            .calls
            .iter()
            .filter(|c| c.as_str() == operation)
            .count()
    }

    fn record(&self, operation: &str) -> DcResult<()> {
        let mut state = self.state.write();
        state.calls.push(operation.to_string());
        debug!(operation, "Memory API call");
        match state.failures.get(operation) {
            Some((status, message)) => Err(ApiError::Status {
                status: *status,
                body: ErrorBody {
                    error_message: Some(message.clone()),
                    ..ErrorBody::default()
                },
            }
            .into()),
            None => Ok(()),
        }
    }

    fn token(&self) -> Option<String> {
        self.session.as_ref().and_then(|s| s.access_token())
    }

    /// A backend with sample data: an admin and a regular account,
    /// two municipalities with templates, professionals of every type,
    /// two projects and a small survey index.
    pub fn seeded() -> Self {
        let api = Self::new()
            .with_account("admin@docconstruct.local", "admin1234", &["admin"])
            .with_account("clerk@docconstruct.local", "clerk1234", &[]);
        {
            let mut state = api.state.write();
            seed(&mut state);
        }
        api
    }
}

fn seed(state: &mut State) {
    let municipalities = [
        ("Tel Aviv-Yafo", "permits@tlv.example", "03-7240000"),
        ("Haifa", "rishui@haifa.example", "04-8356356"),
    ];
    for (name, email, phone) in municipalities {
        let id = state.next_id("m");
        state.municipalities.push(Municipality {
            id: Some(id),
            name: name.to_string(),
            contact_email: Some(email.to_string()),
            contact_phone: Some(phone.to_string()),
            created_at: Some(Utc::now()),
            ..Municipality::default()
        });
    }

    let professionals = [
        ("Dana Levi", "0501234567", "dana@levi-arch.example", 2),
        ("Yossi Cohen", "0527654321", "yossi@shilder.example", 1),
        ("Miri Azulay", "0549876543", "miri@bikoret.example", 0),
        ("Avi Peretz", "0533456789", "avi@kablan.example", 4),
        ("Ronit Bar", "0541112233", "ronit@levi-arch.example", 2),
    ];
    for (i, (name, phone, email, type_index)) in professionals.into_iter().enumerate() {
        let id = state.next_id("a");
        let expires = NaiveDate::from_ymd_opt(Utc::now().year() + 1, 12, 31);
        let professional_type = state.types[type_index].clone();
        state.professionals.push(Professional {
            id: Some(id),
            name: name.to_string(),
            national_id: Some(format!("0{:08}", 31_415_926 + i)),
            email: Some(email.to_string()),
            phone: Some(phone.to_string()),
            address: Some("Herzl 1, Tel Aviv".to_string()),
            license_number: Some(format!("L-{}", 1000 + i)),
            license_expiration_date: expires,
            professional_type: Some(professional_type),
            status: Some(ProfessionalStatus::Active),
            created_at: Some(Utc::now()),
            ..Professional::default()
        });
    }

    let template_names = [
        ("Structural supervision appointment", 1),
        ("Architect declaration", 2),
        ("Site inspection form", 0),
    ];
    for municipality_index in 0..state.municipalities.len() {
        let municipality_id = state.municipalities[municipality_index].id.clone();
        for (name, type_index) in template_names {
            let id = state.next_id("t");
            let professional_type = state.types[type_index].clone();
            let template = DocumentTemplate {
                id: Some(id),
                name: name.to_string(),
                municipality_id: municipality_id.clone(),
                professional_type_id: professional_type.id.clone(),
                professional_type: Some(professional_type),
                file: Some(StoredFile {
                    file_name: format!("{}.docx", name.to_lowercase().replace(' ', "_")),
                    ..StoredFile::default()
                }),
                created_at: Some(Utc::now()),
                ..DocumentTemplate::default()
            };
            state.municipalities[municipality_index]
                .templates
                .push(template.clone());
            state.templates.push(template);
        }
    }

    let projects = [
        ("Rothschild 22 extension", "Rothschild 22, Tel Aviv", "TA-2024-118", ProjectStatus::PrePermit, 0),
        ("Carmel residential tower", "Moriah 40, Haifa", "HF-2023-072", ProjectStatus::PostPermit, 1),
    ];
    for (name, address, case_id, status, municipality_index) in projects {
        let id = state.next_id("p");
        let assigned: Vec<ProjectProfessional> = state
            .professionals
            .iter()
            .take(2)
            .cloned()
            .map(ProjectProfessional::from)
            .collect();
        state.projects.push(Project {
            id: Some(id),
            name: name.to_string(),
            case_id: Some(case_id.to_string()),
            address: address.to_string(),
            status: Some(status),
            municipality_id: state.municipalities[municipality_index].id.clone(),
            due_date: NaiveDate::from_ymd_opt(Utc::now().year() + 1, 6, 30),
            professionals: assigned,
            created_at: Some(Utc::now()),
            ..Project::default()
        });
    }

    let questions = [
        ("Do you support urban renewal in your neighborhood?", "Urban renewal 2024", "s-1", &["residents", "tel aviv"][..], "Residents panel", "2024-03-10"),
        ("How satisfied are you with the building permit process?", "Permitting satisfaction", "s-2", &["contractors"][..], "Industry panel", "2024-06-01"),
        ("How long did your building permit take?", "Permitting satisfaction", "s-2", &["contractors", "architects"][..], "Industry panel", "2024-06-01"),
        ("Would you move to a renewed building?", "Urban renewal 2024", "s-1", &["residents"][..], "Residents panel", "2024-03-10"),
        ("Is public transport near your home adequate?", "Mobility survey", "s-3", &["residents", "haifa"][..], "", "2023-11-20"),
    ];
    for (question, survey_name, survey_id, segments, panel, date) in questions {
        state.questions.push(SurveyQuestionHit {
            survey_name: survey_name.to_string(),
            survey_id: survey_id.to_string(),
            survey_date: Some(date.to_string()),
            question: question.to_string(),
            segments: segments.iter().map(|s| s.to_string()).collect(),
            panel: panel.to_string(),
            survey_score: 0.0,
        });
    }

    let mut segments: Vec<SegmentHit> = Vec::new();
    for hit in &state.questions {
        for segment in &hit.segments {
            let survey = SurveyRef {
                survey_id: hit.survey_id.clone(),
                survey_name: hit.survey_name.clone(),
                survey_date: hit.survey_date.clone(),
            };
            match segments.iter_mut().find(|s| &s.segment_name == segment) {
                Some(existing) => {
                    if !existing.surveys.iter().any(|s| s.survey_id == survey.survey_id) {
                        existing.surveys.push(survey);
                        existing.survey_count += 1;
                    }
                }
                None => segments.push(SegmentHit {
                    segment_name: segment.clone(),
                    survey_count: 1,
                    surveys: vec![survey],
                }),
            }
        }
    }
    state.segments = segments;
}

/// Share of query words found in `text`
fn word_score(query: &str, text: &str) -> f64 {
    let text = text.to_lowercase();
    let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if words.is_empty() {
        return 0.0;
    }
    let found = words.iter().filter(|w| text.contains(w.as_str())).count();
    found as f64 / words.len() as f64
}

#[async_trait]
impl AuthBackend for MemoryApi {
    async fn login(&self, request: &LoginRequest) -> DcResult<LoginResponse> {
        self.record("login")?;
        let state = self.state.read();
        let account = state
            .accounts
            .iter()
            .find(|a| a.user.email.eq_ignore_ascii_case(&request.email))
            .filter(|a| a.password == request.password)
            .ok_or_else(|| DcError::Unauthorized {
                message: "Invalid email or password".to_string(),
            })?;
        Ok(LoginResponse {
            access_token: format!(
                "{TOKEN_PREFIX}:{}:{}",
                account.user.email,
                uuid::Uuid::new_v4().simple()
            ),
            user_id: account.user.id.clone(),
            email: account.user.email.clone(),
            roles: account.user.roles.clone(),
        })
    }

    async fn profile(&self) -> DcResult<UserProfile> {
        self.record("profile")?;
        let token = self.token();
        let state = self.state.read();
        let account = state.account_for_token(token)?;
        Ok(UserProfile {
            id: account.user.id.clone(),
            email: account.user.email.clone(),
            roles: account.user.roles.clone(),
        })
    }

    async fn change_password(&self, change: &PasswordChange) -> DcResult<()> {
        self.record("change_password")?;
        let token = self.token();
        let mut state = self.state.write();
        let email = state.account_for_token(token)?.user.email.clone();
        let account = state
            .accounts
            .iter_mut()
            .find(|a| a.user.email == email)
            .ok_or_else(|| DcError::not_found("user", &email))?;
        if account.password != change.current_password {
            return Err(DcError::Unauthorized {
                message: "Invalid current password".to_string(),
            });
        }
        account.password = change.new_password.clone();
        Ok(())
    }
}

#[async_trait]
impl ProjectsApi for MemoryApi {
    async fn list_projects(&self) -> DcResult<Vec<Project>> {
        self.record("list_projects")?;
        Ok(self.state.read().projects.clone())
    }

    async fn get_project(&self, id: &EntityId) -> DcResult<Project> {
        self.record("get_project")?;
        let mut state = self.state.write();
        Ok(state.project_mut(id)?.clone())
    }

    async fn create_project(&self, project: &NewProject) -> DcResult<Project> {
        self.record("create_project")?;
        let mut state = self.state.write();
        let mut professionals = Vec::with_capacity(project.professionals.len());
        for assignment in &project.professionals {
            let professional = state.professional(&assignment.professional_id)?.clone();
            professionals.push(ProjectProfessional::from(professional));
        }
        let id = state.next_id("p");
        let created = Project {
            id: Some(id),
            name: project.name.clone(),
            case_id: project.case_id.clone(),
            description: project.description.clone(),
            address: project.address.clone(),
            status: Some(project.status.clone().unwrap_or_default()),
            municipality_id: project.municipality_id.clone(),
            due_date: project.due_date,
            status_due_date: project.status_due_date,
            professionals,
            created_at: Some(Utc::now()),
            ..Project::default()
        };
        state.projects.push(created.clone());
        Ok(created)
    }

    async fn update_project(&self, update: &ProjectUpdate) -> DcResult<Project> {
        self.record("update_project")?;
        let id = update
            .id
            .clone()
            .ok_or(ApiError::MissingField("project id"))?;
        let mut state = self.state.write();
        let project = state.project_mut(&id)?;
        project.name = update.name.clone();
        project.case_id = update.case_id.clone();
        project.description = update.description.clone();
        project.address = update.address.clone();
        project.status = update.status.clone();
        project.municipality_id = update.municipality_id.clone();
        project.due_date = update.due_date;
        project.status_due_date = update.status_due_date;
        project.start_date = update.start_date;
        project.end_date = update.end_date;
        project.permit_owner = update.permit_owner.clone();
        project.updated_at = Some(Utc::now());
        Ok(project.clone())
    }

    async fn delete_project(&self, id: &EntityId) -> DcResult<()> {
        self.record("delete_project")?;
        let mut state = self.state.write();
        let before = state.projects.len();
        state.projects.retain(|p| p.id.as_ref() != Some(id));
        if state.projects.len() == before {
            return Err(DcError::not_found("project", id));
        }
        Ok(())
    }

    async fn project_statuses(&self) -> DcResult<Vec<ProjectStatus>> {
        self.record("project_statuses")?;
        Ok(self.state.read().statuses.clone())
    }

    async fn attach_professional(&self, link: &ProjectProfessionalLink) -> DcResult<()> {
        self.record("attach_professional")?;
        let mut state = self.state.write();
        let professional = state.professional(&link.professional_id)?.clone();
        let project = state.project_mut(&link.project_id)?;
        if project.has_professional(&link.professional_id) {
            return Err(DcError::Conflict {
                message: "Professional already assigned to project".to_string(),
            });
        }
        project.professionals.push(ProjectProfessional::from(professional));
        Ok(())
    }

    async fn detach_professional(&self, link: &ProjectProfessionalLink) -> DcResult<()> {
        self.record("detach_professional")?;
        let mut state = self.state.write();
        let project = state.project_mut(&link.project_id)?;
        let before = project.professionals.len();
        project
            .professionals
            .retain(|pp| pp.professional_id() != Some(&link.professional_id));
        if project.professionals.len() == before {
            return Err(DcError::not_found("project professional", &link.professional_id));
        }
        Ok(())
    }

    async fn upload_project_document(
        &self,
        project_id: &EntityId,
        upload: DocumentUpload,
    ) -> DcResult<()> {
        self.record("upload_project_document")?;
        let mut state = self.state.write();
        state.project_mut(project_id)?;
        let document_id = state.next_id("d");
        let stored = state.store_file(&document_id, &upload.file);
        let document = UploadedDocument {
            id: Some(document_id),
            document_type: upload.document_type,
            name: upload.document_name,
            status: Some(DocumentStatus::parse(
                upload.status.as_deref().unwrap_or("Uploaded"),
            )),
            file_id: stored.id,
            file_name: Some(stored.file_name),
            file_type: stored.file_type,
            created_at: Some(Utc::now()),
            ..UploadedDocument::default()
        };
        state.project_mut(project_id)?.documents.push(document);
        Ok(())
    }

    async fn download_project_document(
        &self,
        project_id: &EntityId,
        document_id: &EntityId,
    ) -> DcResult<DownloadedFile> {
        self.record("download_project_document")?;
        let mut state = self.state.write();
        let project = state.project_mut(project_id)?;
        if !project.documents.iter().any(|d| d.id.as_ref() == Some(document_id)) {
            return Err(DcError::not_found("document", document_id));
        }
        state
            .files
            .get(document_id)
            .cloned()
            .ok_or_else(|| DcError::not_found("file", document_id))
    }

    async fn delete_project_document(
        &self,
        project_id: &EntityId,
        document_id: &EntityId,
    ) -> DcResult<()> {
        self.record("delete_project_document")?;
        let mut state = self.state.write();
        let project = state.project_mut(project_id)?;
        let before = project.documents.len();
        project.documents.retain(|d| d.id.as_ref() != Some(document_id));
        if project.documents.len() == before {
            return Err(DcError::not_found("document", document_id));
        }
        state.files.remove(document_id);
        Ok(())
    }

    async fn project_document_types(&self) -> DcResult<Vec<String>> {
        self.record("project_document_types")?;
        Ok(PROJECT_DOCUMENT_TYPES.iter().map(|t| t.to_string()).collect())
    }
}

#[async_trait]
impl ProfessionalsApi for MemoryApi {
    async fn list_professionals(&self) -> DcResult<Vec<Professional>> {
        self.record("list_professionals")?;
        Ok(self.state.read().professionals.clone())
    }

    async fn get_professional(&self, id: &EntityId) -> DcResult<Professional> {
        self.record("get_professional")?;
        Ok(self.state.read().professional(id)?.clone())
    }

    async fn create_professional(&self, professional: &NewProfessional) -> DcResult<Professional> {
        self.record("create_professional")?;
        let mut state = self.state.write();
        if state
            .professionals
            .iter()
            .any(|p| p.national_id.as_deref() == Some(professional.national_id.as_str()))
        {
            return Err(DcError::Conflict {
                message: "A professional with this national id already exists".to_string(),
            });
        }
        let id = state.next_id("a");
        let professional_type = state.resolve_type(&professional.professional_type);
        let created = Professional {
            id: Some(id),
            name: professional.name.clone(),
            national_id: Some(professional.national_id.clone()),
            email: Some(professional.email.clone()),
            phone: Some(professional.phone.clone()),
            address: Some(professional.address.clone()),
            license_number: Some(professional.license_number.clone()),
            license_expiration_date: lenient_date::parse(&professional.license_expiration_date),
            professional_type: Some(professional_type),
            status: Some(ProfessionalStatus::Active),
            created_at: Some(Utc::now()),
            ..Professional::default()
        };
        state.professionals.push(created.clone());
        Ok(created)
    }

    async fn update_professional(&self, professional: &Professional) -> DcResult<Professional> {
        self.record("update_professional")?;
        let id = professional
            .id
            .clone()
            .ok_or(ApiError::MissingField("professional id"))?;
        let mut state = self.state.write();
        let existing = state.professional_mut(&id)?;
        let documents = std::mem::take(&mut existing.documents);
        *existing = Professional {
            documents,
            updated_at: Some(Utc::now()),
            created_at: existing.created_at,
            ..professional.clone()
        };
        Ok(existing.clone())
    }

    async fn delete_professional(&self, id: &EntityId) -> DcResult<()> {
        self.record("delete_professional")?;
        let mut state = self.state.write();
        let before = state.professionals.len();
        state.professionals.retain(|p| p.id.as_ref() != Some(id));
        if state.professionals.len() == before {
            return Err(DcError::not_found("professional", id));
        }
        for project in &mut state.projects {
            project.professionals.retain(|pp| pp.professional_id() != Some(id));
        }
        Ok(())
    }

    async fn professional_types(&self) -> DcResult<Vec<ProfessionalType>> {
        self.record("professional_types")?;
        Ok(self.state.read().types.clone())
    }

    async fn professional_statuses(&self) -> DcResult<Vec<ProfessionalStatus>> {
        self.record("professional_statuses")?;
        Ok(ProfessionalStatus::KNOWN.to_vec())
    }

    async fn upload_professional_document(
        &self,
        professional_id: &EntityId,
        upload: DocumentUpload,
    ) -> DcResult<()> {
        self.record("upload_professional_document")?;
        let mut state = self.state.write();
        state.professional(professional_id)?;
        let document_id = state.next_id("d");
        let stored = state.store_file(&document_id, &upload.file);
        let document = UploadedDocument {
            id: Some(document_id),
            document_type: upload.document_type,
            name: upload.document_name,
            status: Some(DocumentStatus::Uploaded),
            file_id: stored.id,
            file_name: Some(stored.file_name),
            file_type: stored.file_type,
            professional_id: Some(professional_id.clone()),
            created_at: Some(Utc::now()),
        };
        state.professional_mut(professional_id)?.documents.push(document);
        Ok(())
    }

    async fn download_professional_document(
        &self,
        professional_id: &EntityId,
        document_id: &EntityId,
    ) -> DcResult<DownloadedFile> {
        self.record("download_professional_document")?;
        let state = self.state.read();
        let professional = state.professional(professional_id)?;
        if !professional.documents.iter().any(|d| d.id.as_ref() == Some(document_id)) {
            return Err(DcError::not_found("document", document_id));
        }
        state
            .files
            .get(document_id)
            .cloned()
            .ok_or_else(|| DcError::not_found("file", document_id))
    }

    async fn delete_professional_document(
        &self,
        professional_id: &EntityId,
        document_id: &EntityId,
    ) -> DcResult<()> {
        self.record("delete_professional_document")?;
        let mut state = self.state.write();
        let professional = state.professional_mut(professional_id)?;
        let before = professional.documents.len();
        professional.documents.retain(|d| d.id.as_ref() != Some(document_id));
        if professional.documents.len() == before {
            return Err(DcError::not_found("document", document_id));
        }
        state.files.remove(document_id);
        Ok(())
    }

    async fn professional_document_types(&self) -> DcResult<Vec<String>> {
        self.record("professional_document_types")?;
        Ok(PROFESSIONAL_DOCUMENT_TYPES.iter().map(|t| t.to_string()).collect())
    }

    /// No OCR here: the draft is prefilled from the file name only.
    async fn import_professional(&self, file: UploadFile) -> DcResult<NewProfessional> {
        self.record("import_professional")?;
        if file.is_empty() {
            return Err(ApiError::Status {
                status: 400,
                body: ErrorBody {
                    error_message: Some("No file provided".to_string()),
                    ..ErrorBody::default()
                },
            }
            .into());
        }
        let stem = file
            .file_name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&file.file_name)
            .replace(['_', '-'], " ");
        Ok(NewProfessional {
            name: stem.trim().to_string(),
            ..NewProfessional::default()
        })
    }
}

#[async_trait]
impl MunicipalitiesApi for MemoryApi {
    async fn list_municipalities(&self) -> DcResult<Vec<Municipality>> {
        self.record("list_municipalities")?;
        Ok(self.state.read().municipalities.clone())
    }

    async fn get_municipality(&self, id: &EntityId) -> DcResult<Municipality> {
        self.record("get_municipality")?;
        self.state
            .read()
            .municipalities
            .iter()
            .find(|m| m.id.as_ref() == Some(id))
            .cloned()
            .ok_or_else(|| DcError::not_found("municipality", id))
    }

    async fn create_municipality(&self, municipality: &NewMunicipality) -> DcResult<Municipality> {
        self.record("create_municipality")?;
        let mut state = self.state.write();
        let id = state.next_id("m");
        let created = Municipality {
            id: Some(id),
            created_at: Some(Utc::now()),
            ..apply_municipality(Municipality::default(), municipality)
        };
        state.municipalities.push(created.clone());
        Ok(created)
    }

    async fn update_municipality(
        &self,
        id: &EntityId,
        municipality: &NewMunicipality,
    ) -> DcResult<Municipality> {
        self.record("update_municipality")?;
        let mut state = self.state.write();
        let existing = state
            .municipalities
            .iter_mut()
            .find(|m| m.id.as_ref() == Some(id))
            .ok_or_else(|| DcError::not_found("municipality", id))?;
        *existing = Municipality {
            updated_at: Some(Utc::now()),
            ..apply_municipality(existing.clone(), municipality)
        };
        Ok(existing.clone())
    }

    async fn delete_municipality(&self, id: &EntityId) -> DcResult<()> {
        self.record("delete_municipality")?;
        let mut state = self.state.write();
        let before = state.municipalities.len();
        state.municipalities.retain(|m| m.id.as_ref() != Some(id));
        if state.municipalities.len() == before {
            return Err(DcError::not_found("municipality", id));
        }
        state.templates.retain(|t| t.municipality_id.as_ref() != Some(id));
        Ok(())
    }

    async fn list_templates(
        &self,
        municipality_id: Option<&EntityId>,
    ) -> DcResult<Vec<DocumentTemplate>> {
        self.record("list_templates")?;
        Ok(self
            .state
            .read()
            .templates
            .iter()
            .filter(|t| municipality_id.is_none() || t.municipality_id.as_ref() == municipality_id)
            .cloned()
            .collect())
    }

    async fn create_template(&self, template: &NewTemplate) -> DcResult<DocumentTemplate> {
        self.record("create_template")?;
        let file = template.file.as_ref().ok_or(ApiError::MissingField("file"))?;
        let municipality_id = template
            .municipality_id
            .clone()
            .ok_or(ApiError::MissingField("municipality_id"))?;
        let mut state = self.state.write();
        let index = state
            .municipalities
            .iter()
            .position(|m| m.id.as_ref() == Some(&municipality_id))
            .ok_or_else(|| DcError::not_found("municipality", &municipality_id))?;
        let id = state.next_id("t");
        let stored = state.store_file(&id, file);
        let professional_type = template
            .professional_type_id
            .as_ref()
            .and_then(|type_id| state.types.iter().find(|t| t.id.as_ref() == Some(type_id)))
            .cloned();
        let created = DocumentTemplate {
            id: Some(id),
            name: template.name.clone(),
            description: template.description.clone(),
            municipality_id: Some(municipality_id),
            professional_type_id: template.professional_type_id.clone(),
            professional_type,
            file: Some(stored),
            created_at: Some(Utc::now()),
        };
        state.municipalities[index].templates.push(created.clone());
        state.templates.push(created.clone());
        Ok(created)
    }

    async fn delete_template(&self, id: &EntityId) -> DcResult<()> {
        self.record("delete_template")?;
        let mut state = self.state.write();
        let before = state.templates.len();
        state.templates.retain(|t| t.id.as_ref() != Some(id));
        if state.templates.len() == before {
            return Err(DcError::not_found("template", id));
        }
        for municipality in &mut state.municipalities {
            municipality.templates.retain(|t| t.id.as_ref() != Some(id));
        }
        state.files.remove(id);
        Ok(())
    }
}

fn apply_municipality(base: Municipality, update: &NewMunicipality) -> Municipality {
    Municipality {
        name: update.name.clone(),
        state: update.state.clone(),
        county: update.county.clone(),
        address: update.address.clone(),
        contact_person: update.contact_person.clone(),
        contact_email: update.contact_email.clone(),
        contact_phone: update.contact_phone.clone(),
        website: update.website.clone(),
        ..base
    }
}

#[async_trait]
impl DocumentsApi for MemoryApi {
    async fn generate_document(&self, request: &GenerateDocument) -> DcResult<GeneratedDocument> {
        self.record("generate_document")?;
        let mut state = self.state.write();
        let template = state
            .templates
            .iter()
            .find(|t| t.id.as_ref() == Some(&request.template_id))
            .cloned()
            .ok_or_else(|| DcError::not_found("template", &request.template_id))?;
        state.project_mut(&request.project_id)?;
        let id = state.next_id("g");
        let generated = GeneratedDocument {
            id: Some(id),
            project_id: Some(request.project_id.clone()),
            template_id: Some(request.template_id.clone()),
            status: Some(DocumentStatus::Pending),
            template: Some(template),
            created_at: Some(Utc::now()),
            ..GeneratedDocument::default()
        };
        state
            .project_mut(&request.project_id)?
            .generated_documents
            .push(generated.clone());
        Ok(generated)
    }

    async fn upload_generated_document(
        &self,
        document_id: &EntityId,
        file: UploadFile,
    ) -> DcResult<()> {
        self.record("upload_generated_document")?;
        let mut state = self.state.write();
        let stored = state.store_file(document_id, &file);
        let document = state
            .projects
            .iter_mut()
            .flat_map(|p| p.generated_documents.iter_mut())
            .find(|d| d.id.as_ref() == Some(document_id))
            .ok_or_else(|| DcError::not_found("generated document", document_id))?;
        document.file_id = stored.id.clone();
        document.file = Some(stored);
        document.status = Some(DocumentStatus::Uploaded);
        Ok(())
    }
}

#[async_trait]
impl UsersApi for MemoryApi {
    async fn list_users(&self) -> DcResult<Vec<ManagedUser>> {
        self.record("list_users")?;
        Ok(self
            .state
            .read()
            .accounts
            .iter()
            .map(|a| a.user.clone())
            .collect())
    }

    async fn create_user(&self, user: &NewUser) -> DcResult<ManagedUser> {
        self.record("create_user")?;
        let mut state = self.state.write();
        if state
            .accounts
            .iter()
            .any(|a| a.user.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(DcError::Conflict {
                message: "User already exists".to_string(),
            });
        }
        let id = state.next_id("u");
        let created = ManagedUser {
            id: Some(id),
            email: user.email.clone(),
            roles: user.roles.clone(),
            created_at: Some(Utc::now()),
        };
        state.accounts.push(Account {
            user: created.clone(),
            password: user.password.clone(),
        });
        Ok(created)
    }

    async fn delete_user(&self, id: &EntityId) -> DcResult<()> {
        self.record("delete_user")?;
        let mut state = self.state.write();
        let before = state.accounts.len();
        state.accounts.retain(|a| a.user.id.as_ref() != Some(id));
        if state.accounts.len() == before {
            return Err(DcError::not_found("user", id));
        }
        Ok(())
    }
}

#[async_trait]
impl SurveyApi for MemoryApi {
    /// Word-overlap scoring; `segment:<name>` matches by segment instead.
    async fn search_questions(
        &self,
        query: &str,
        threshold: f64,
    ) -> DcResult<Vec<SurveyQuestionHit>> {
        self.record("search_questions")?;
        let state = self.state.read();
        let mut hits: Vec<SurveyQuestionHit> = match query.trim().strip_prefix("segment:") {
            Some(segment) => state
                .questions
                .iter()
                .filter(|q| q.segments.iter().any(|s| s.eq_ignore_ascii_case(segment.trim())))
                .cloned()
                .map(|q| SurveyQuestionHit {
                    survey_score: 1.0,
                    ..q
                })
                .collect(),
            None => state
                .questions
                .iter()
                .map(|q| SurveyQuestionHit {
                    survey_score: word_score(query, &q.question),
                    ..q.clone()
                })
                .filter(|q| q.survey_score > 0.0 && q.survey_score >= threshold)
                .collect(),
        };
        hits.sort_by(|a, b| b.survey_score.total_cmp(&a.survey_score));
        Ok(hits)
    }

    async fn search_segments(&self) -> DcResult<Vec<SegmentHit>> {
        self.record("search_segments")?;
        Ok(self.state.read().segments.clone())
    }
}
