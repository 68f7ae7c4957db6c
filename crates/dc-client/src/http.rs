//! reqwest-backed client for the DocConstruct backend

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dc_auth::{AuthBackend, SessionStore};
use dc_core::config::ApiConfig;
use dc_core::{DcResult, EntityId};
use dc_models::{
    DocumentTemplate, DocumentUpload, GenerateDocument, GeneratedDocument, LoginRequest,
    LoginResponse, ManagedUser, Municipality, NewMunicipality, NewProfessional, NewProject,
    NewTemplate, NewUser, PasswordChange, Professional, ProfessionalStatus, ProfessionalType,
    Project, ProjectProfessionalLink, ProjectStatus, ProjectUpdate, SegmentHit,
    SurveyQuestionHit, UploadFile, UserProfile,
};
use reqwest::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::api::*;
use crate::envelope::{extract, extract_any, extract_list};
use crate::error::{ApiError, ErrorBody};
use crate::routes;

/// HTTP implementation of every resource trait.
///
/// The bearer token is read from the session store on each request, so a
/// login or logout takes effect without rebuilding the client.
pub struct HttpApi {
    client: Client,
    base_url: Url,
    session: Arc<dyn SessionStore>,
}

impl HttpApi {
    pub fn new(config: &ApiConfig, session: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            base_url: base_url(&config.base_url)?,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn url_with_query(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = self.url(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().copied());
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(method = %method, url = %url, "API request");
        let builder = self.client.request(method, url);
        match self.session.access_token() {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
            None => builder,
        }
    }

    /// Send and turn non-2xx responses into [`ApiError::Status`]
    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let body = ErrorBody::parse(&text);
        warn!(status = status.as_u16(), message = ?body.best_message(), "API request failed");
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Send and decode the body as JSON; an empty body reads as `null`
    async fn send_json(&self, builder: RequestBuilder) -> Result<Value, ApiError> {
        let text = self.send(builder).await?.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::decode("response body", e))
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        let url = self.url_with_query(path, query)?;
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn write<B: Serialize + ?Sized + Sync>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let url = self.url(path)?;
        self.send_json(self.request(method, url).json(body)).await
    }

    async fn delete(&self, path: &str, query: &[(&str, &str)]) -> Result<(), ApiError> {
        let url = self.url_with_query(path, query)?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    async fn post_form(&self, path: &str, form: Form) -> Result<Value, ApiError> {
        let url = self.url(path)?;
        self.send_json(self.request(Method::POST, url).multipart(form)).await
    }

    async fn download(
        &self,
        path: &str,
        query: &[(&str, &str)],
        fallback_name: &str,
    ) -> Result<DownloadedFile, ApiError> {
        let url = self.url_with_query(path, query)?;
        let response = self.send(self.request(Method::GET, url)).await?;
        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let file_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_name)
            .unwrap_or_else(|| fallback_name.to_string());
        let data = response.bytes().await?;
        debug!(file = %file_name, bytes = data.len(), "Downloaded file");
        Ok(DownloadedFile {
            file_name,
            content_type,
            data,
        })
    }
}

/// Directory-style base URL so relative joins keep the `/api` prefix
fn base_url(raw: &str) -> Result<Url, ApiError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Ok(Url::parse(&normalized)?)
}

/// File name from a `Content-Disposition` header
fn attachment_name(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

fn file_part(file: &UploadFile) -> Result<Part, ApiError> {
    Ok(Part::bytes(file.data.to_vec())
        .file_name(file.file_name.clone())
        .mime_str(&file.content_type)?)
}

#[async_trait]
impl AuthBackend for HttpApi {
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn login(&self, request: &LoginRequest) -> DcResult<LoginResponse> {
        let value = self.write(Method::POST, routes::LOGIN, request).await?;
        Ok(serde_json::from_value(value).map_err(|e| ApiError::decode("login response", e))?)
    }

    async fn profile(&self) -> DcResult<UserProfile> {
        let value = self.get(routes::PROFILE, &[]).await?;
        Ok(extract_any(value, &["user", "profile"])?)
    }

    #[instrument(skip_all)]
    async fn change_password(&self, change: &PasswordChange) -> DcResult<()> {
        self.write(Method::POST, routes::CHANGE_PASSWORD, change).await?;
        Ok(())
    }
}

#[async_trait]
impl ProjectsApi for HttpApi {
    #[instrument(skip(self))]
    async fn list_projects(&self) -> DcResult<Vec<Project>> {
        let value = self.get(routes::PROJECTS, &[]).await?;
        Ok(extract_list(value, "projects")?)
    }

    #[instrument(skip(self))]
    async fn get_project(&self, id: &EntityId) -> DcResult<Project> {
        let value = self.get(routes::PROJECT, &[("project_id", id.as_str())]).await?;
        Ok(extract(value, "project")?)
    }

    #[instrument(skip(self, project), fields(name = %project.name))]
    async fn create_project(&self, project: &NewProject) -> DcResult<Project> {
        let value = self.write(Method::POST, routes::PROJECT, project).await?;
        Ok(extract(value, "project")?)
    }

    #[instrument(skip(self, update), fields(id = ?update.id))]
    async fn update_project(&self, update: &ProjectUpdate) -> DcResult<Project> {
        let value = self.write(Method::PUT, routes::PROJECT, update).await?;
        Ok(extract(value, "project")?)
    }

    #[instrument(skip(self))]
    async fn delete_project(&self, id: &EntityId) -> DcResult<()> {
        Ok(self.delete(routes::PROJECT, &[("project_id", id.as_str())]).await?)
    }

    async fn project_statuses(&self) -> DcResult<Vec<ProjectStatus>> {
        let value = self.get(routes::PROJECT_STATUSES, &[]).await?;
        Ok(extract_list(value, "statuses")?)
    }

    #[instrument(skip(self))]
    async fn attach_professional(&self, link: &ProjectProfessionalLink) -> DcResult<()> {
        self.write(Method::POST, routes::PROJECT_PROFESSIONALS, link).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn detach_professional(&self, link: &ProjectProfessionalLink) -> DcResult<()> {
        self.write(Method::DELETE, routes::PROJECT_PROFESSIONALS, link).await?;
        Ok(())
    }

    #[instrument(skip(self, upload), fields(document_type = %upload.document_type))]
    async fn upload_project_document(
        &self,
        project_id: &EntityId,
        upload: DocumentUpload,
    ) -> DcResult<()> {
        let form = Form::new()
            .text("project_id", project_id.to_string())
            .text("document_type", upload.document_type.clone())
            .text("document_name", upload.document_name.clone())
            .text("status", upload.status.clone().unwrap_or_else(|| "Uploaded".to_string()))
            .part("file", file_part(&upload.file)?);
        self.post_form(routes::PROJECT_DOCUMENT, form).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn download_project_document(
        &self,
        project_id: &EntityId,
        document_id: &EntityId,
    ) -> DcResult<DownloadedFile> {
        let query = [
            ("project_id", project_id.as_str()),
            ("document_id", document_id.as_str()),
        ];
        Ok(self
            .download(routes::PROJECT_DOCUMENT, &query, document_id.as_str())
            .await?)
    }

    #[instrument(skip(self))]
    async fn delete_project_document(
        &self,
        project_id: &EntityId,
        document_id: &EntityId,
    ) -> DcResult<()> {
        let query = [
            ("project_id", project_id.as_str()),
            ("document_id", document_id.as_str()),
        ];
        Ok(self.delete(routes::PROJECT_DOCUMENT, &query).await?)
    }

    async fn project_document_types(&self) -> DcResult<Vec<String>> {
        let value = self.get(routes::PROJECT_DOCUMENT_TYPES, &[]).await?;
        Ok(extract_any(value, &["types", "document_types"])?)
    }
}

#[async_trait]
impl ProfessionalsApi for HttpApi {
    #[instrument(skip(self))]
    async fn list_professionals(&self) -> DcResult<Vec<Professional>> {
        let value = self.get(routes::PROFESSIONALS, &[]).await?;
        Ok(extract_list(value, "professionals")?)
    }

    #[instrument(skip(self))]
    async fn get_professional(&self, id: &EntityId) -> DcResult<Professional> {
        let value = self
            .get(routes::PROFESSIONAL, &[("professional_id", id.as_str())])
            .await?;
        Ok(extract(value, "professional")?)
    }

    #[instrument(skip(self, professional), fields(name = %professional.name))]
    async fn create_professional(&self, professional: &NewProfessional) -> DcResult<Professional> {
        let value = self.write(Method::POST, routes::PROFESSIONAL, professional).await?;
        Ok(extract(value, "professional")?)
    }

    #[instrument(skip(self, professional), fields(id = ?professional.id))]
    async fn update_professional(&self, professional: &Professional) -> DcResult<Professional> {
        let value = self.write(Method::PUT, routes::PROFESSIONAL, professional).await?;
        Ok(extract(value, "professional")?)
    }

    #[instrument(skip(self))]
    async fn delete_professional(&self, id: &EntityId) -> DcResult<()> {
        Ok(self
            .delete(routes::PROFESSIONAL, &[("professional_id", id.as_str())])
            .await?)
    }

    async fn professional_types(&self) -> DcResult<Vec<ProfessionalType>> {
        let value = self.get(routes::PROFESSIONAL_TYPES, &[]).await?;
        Ok(extract_list(value, "types")?)
    }

    async fn professional_statuses(&self) -> DcResult<Vec<ProfessionalStatus>> {
        let value = self.get(routes::PROFESSIONAL_STATUSES, &[]).await?;
        Ok(extract_list(value, "statuses")?)
    }

    #[instrument(skip(self, upload), fields(document_type = %upload.document_type))]
    async fn upload_professional_document(
        &self,
        professional_id: &EntityId,
        upload: DocumentUpload,
    ) -> DcResult<()> {
        let form = Form::new()
            .text("professional_id", professional_id.to_string())
            .text("document_type", upload.document_type.clone())
            .text("document_name", upload.document_name.clone())
            .part("file", file_part(&upload.file)?);
        self.post_form(routes::PROFESSIONAL_DOCUMENT, form).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn download_professional_document(
        &self,
        professional_id: &EntityId,
        document_id: &EntityId,
    ) -> DcResult<DownloadedFile> {
        let query = [
            ("professional_id", professional_id.as_str()),
            ("document_id", document_id.as_str()),
        ];
        Ok(self
            .download(routes::PROFESSIONAL_DOCUMENT, &query, document_id.as_str())
            .await?)
    }

    #[instrument(skip(self))]
    async fn delete_professional_document(
        &self,
        professional_id: &EntityId,
        document_id: &EntityId,
    ) -> DcResult<()> {
        let query = [
            ("professional_id", professional_id.as_str()),
            ("document_id", document_id.as_str()),
        ];
        Ok(self.delete(routes::PROFESSIONAL_DOCUMENT, &query).await?)
    }

    async fn professional_document_types(&self) -> DcResult<Vec<String>> {
        let value = self.get(routes::PROFESSIONAL_DOCUMENT_TYPES, &[]).await?;
        Ok(extract_any(value, &["types", "document_types"])?)
    }

    #[instrument(skip(self, file), fields(file = %file.file_name))]
    async fn import_professional(&self, file: UploadFile) -> DcResult<NewProfessional> {
        let form = Form::new().part("file", file_part(&file)?);
        let value = self.post_form(routes::PROFESSIONAL_IMPORT, form).await?;
        let extracted: Professional = extract_any(value, &["professional", "data"])?;
        Ok(NewProfessional::from(extracted))
    }
}

#[async_trait]
impl MunicipalitiesApi for HttpApi {
    #[instrument(skip(self))]
    async fn list_municipalities(&self) -> DcResult<Vec<Municipality>> {
        let value = self.get(routes::MUNICIPALITIES, &[]).await?;
        Ok(extract_list(value, "municipalities")?)
    }

    #[instrument(skip(self))]
    async fn get_municipality(&self, id: &EntityId) -> DcResult<Municipality> {
        let value = self.get(&routes::municipality(id.as_str()), &[]).await?;
        Ok(extract(value, "municipality")?)
    }

    #[instrument(skip(self, municipality), fields(name = %municipality.name))]
    async fn create_municipality(&self, municipality: &NewMunicipality) -> DcResult<Municipality> {
        let value = self
            .write(Method::POST, routes::MUNICIPALITIES, municipality)
            .await?;
        Ok(extract(value, "municipality")?)
    }

    #[instrument(skip(self, municipality))]
    async fn update_municipality(
        &self,
        id: &EntityId,
        municipality: &NewMunicipality,
    ) -> DcResult<Municipality> {
        let value = self
            .write(Method::PUT, &routes::municipality(id.as_str()), municipality)
            .await?;
        Ok(extract(value, "municipality")?)
    }

    #[instrument(skip(self))]
    async fn delete_municipality(&self, id: &EntityId) -> DcResult<()> {
        Ok(self.delete(&routes::municipality(id.as_str()), &[]).await?)
    }

    #[instrument(skip(self))]
    async fn list_templates(
        &self,
        municipality_id: Option<&EntityId>,
    ) -> DcResult<Vec<DocumentTemplate>> {
        let query: Vec<(&str, &str)> = municipality_id
            .map(|id| vec![("municipality_id", id.as_str())])
            .unwrap_or_default();
        let value = self.get(routes::TEMPLATES, &query).await?;
        Ok(extract_any(value, &["templates", "document_templates"])?)
    }

    #[instrument(skip(self, template), fields(name = %template.name))]
    async fn create_template(&self, template: &NewTemplate) -> DcResult<DocumentTemplate> {
        let mut form = Form::new().text("name", template.name.clone());
        if let Some(description) = &template.description {
            form = form.text("description", description.clone());
        }
        if let Some(type_id) = &template.professional_type_id {
            form = form.text("professional_type_id", type_id.to_string());
        }
        if let Some(municipality_id) = &template.municipality_id {
            form = form.text("municipality_id", municipality_id.to_string());
        }
        if !template.required_fields.is_empty() {
            let fields = serde_json::to_string(&template.required_fields)
                .map_err(|e| ApiError::decode("required fields", e))?;
            form = form.text("required_fields", fields);
        }
        let file = template.file.as_ref().ok_or(ApiError::MissingField("file"))?;
        form = form.part("file", file_part(file)?);

        let value = self.post_form(routes::TEMPLATES, form).await?;
        Ok(extract(value, "template")?)
    }

    #[instrument(skip(self))]
    async fn delete_template(&self, id: &EntityId) -> DcResult<()> {
        Ok(self.delete(&routes::template(id.as_str()), &[]).await?)
    }
}

#[async_trait]
impl DocumentsApi for HttpApi {
    #[instrument(skip(self))]
    async fn generate_document(&self, request: &GenerateDocument) -> DcResult<GeneratedDocument> {
        let value = self
            .write(Method::POST, routes::GENERATE_DOCUMENT, request)
            .await?;
        Ok(extract(value, "document")?)
    }

    #[instrument(skip(self, file), fields(file = %file.file_name))]
    async fn upload_generated_document(
        &self,
        document_id: &EntityId,
        file: UploadFile,
    ) -> DcResult<()> {
        let form = Form::new()
            .text("document_id", document_id.to_string())
            .part("file", file_part(&file)?);
        self.post_form(routes::UPLOAD_DOCUMENT, form).await?;
        Ok(())
    }
}

#[async_trait]
impl UsersApi for HttpApi {
    async fn list_users(&self) -> DcResult<Vec<ManagedUser>> {
        let value = self.get(routes::USERS, &[]).await?;
        Ok(extract_list(value, "users")?)
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create_user(&self, user: &NewUser) -> DcResult<ManagedUser> {
        let value = self.write(Method::POST, routes::USERS, user).await?;
        Ok(extract(value, "user")?)
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: &EntityId) -> DcResult<()> {
        Ok(self.delete(&routes::user(id.as_str()), &[]).await?)
    }
}

#[async_trait]
impl SurveyApi for HttpApi {
    #[instrument(skip(self))]
    async fn search_questions(
        &self,
        query: &str,
        threshold: f64,
    ) -> DcResult<Vec<SurveyQuestionHit>> {
        let threshold = threshold.to_string();
        let value = self
            .get(
                routes::SEARCH_QUESTIONS,
                &[("query", query), ("threshold", threshold.as_str())],
            )
            .await?;
        Ok(extract_any(value, &["results", "questions"])?)
    }

    async fn search_segments(&self) -> DcResult<Vec<SegmentHit>> {
        let value = self.get(routes::SEARCH_SEGMENTS, &[]).await?;
        Ok(extract_any(value, &["segments", "results"])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Multipart, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use dc_auth::{MemorySessionStore, Session};
    use dc_core::DcError;
    use serde_json::json;
    use std::collections::HashMap;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn client(base_url: String, token: Option<&str>) -> HttpApi {
        let store = match token {
            Some(token) => MemorySessionStore::with_session(
                &Session::new("dana@build.co.il", token),
                chrono::Duration::days(7),
            ),
            None => MemorySessionStore::new(),
        };
        let config = ApiConfig {
            base_url,
            ..ApiConfig::default()
        };
        HttpApi::new(&config, Arc::new(store)).unwrap()
    }

    #[test]
    fn test_base_url_keeps_prefix() {
        let url = base_url("http://localhost:5000/api").unwrap();
        assert_eq!(url.join("project/statuses").unwrap().as_str(), "http://localhost:5000/api/project/statuses");
    }

    #[test]
    fn test_attachment_name() {
        assert_eq!(
            attachment_name(r#"attachment; filename="plan.pdf""#).as_deref(),
            Some("plan.pdf")
        );
        assert_eq!(attachment_name("inline"), None);
    }

    #[tokio::test]
    async fn test_bearer_token_and_envelope() {
        async fn projects(headers: HeaderMap) -> (StatusCode, Json<Value>) {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            if auth != "Bearer tok-1" {
                return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Missing token"})));
            }
            (
                StatusCode::OK,
                Json(json!({"projects": [{"project_id": 1, "project_name": "Tower A", "address": "Herzl 1"}]})),
            )
        }
        let base = serve(Router::new().route("/api/projects", get(projects))).await;

        let projects = client(base.clone(), Some("tok-1")).list_projects().await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "Tower A");

        let err = client(base, None).list_projects().await.unwrap_err();
        assert!(matches!(err, DcError::Unauthorized { message } if message == "Missing token"));
    }

    #[tokio::test]
    async fn test_query_parameters_and_structured_errors() {
        async fn project(Query(q): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
            match q.get("project_id").map(String::as_str) {
                Some("7") => (StatusCode::OK, Json(json!({"project": {"id": 7, "name": "Villa"}}))),
                _ => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "status_code": 400,
                        "error_code": "BAD_ID",
                        "error_message": "Unknown project",
                        "error_params": {"validation_errors": {"project_id": "does not exist"}}
                    })),
                ),
            }
        }
        let api = client(serve(Router::new().route("/api/project", get(project))).await, None);

        let found = api.get_project(&EntityId::from(7)).await.unwrap();
        assert_eq!(found.name, "Villa");

        match api.get_project(&EntityId::from(8)).await.unwrap_err() {
            DcError::Api(failure) => {
                assert_eq!(failure.status, 400);
                assert_eq!(failure.code.as_deref(), Some("BAD_ID"));
                assert_eq!(failure.message.as_deref(), Some("Unknown project"));
                assert!(failure.validation.has_error("project_id"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_multipart_project_upload() {
        async fn upload(mut multipart: Multipart) -> Json<Value> {
            let mut fields = serde_json::Map::new();
            while let Some(field) = multipart.next_field().await.unwrap() {
                let name = field.name().unwrap_or_default().to_string();
                if name == "file" {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await.unwrap();
                    fields.insert("file_name".into(), json!(file_name));
                    fields.insert("file_len".into(), json!(bytes.len()));
                } else {
                    fields.insert(name, json!(field.text().await.unwrap()));
                }
            }
            Json(Value::Object(fields))
        }
        let echoed = Arc::new(parking_lot::Mutex::new(Value::Null));
        let sink = echoed.clone();
        let router = Router::new().route(
            "/api/project/document",
            post(move |multipart: Multipart| {
                let sink = sink.clone();
                async move {
                    let Json(value) = upload(multipart).await;
                    *sink.lock() = value;
                    Json(json!({"message": "ok"}))
                }
            }),
        );
        let api = client(serve(router).await, Some("tok-1"));

        let file = UploadFile::from_bytes("permit.pdf", &b"%PDF-1.7 body"[..]);
        api.upload_project_document(
            &EntityId::from("p1"),
            DocumentUpload::new("בקשה לתחילת עבודות", file),
        )
        .await
        .unwrap();

        let seen = echoed.lock().clone();
        assert_eq!(seen["project_id"], "p1");
        assert_eq!(seen["document_type"], "בקשה לתחילת עבודות");
        assert_eq!(seen["document_name"], "permit.pdf");
        assert_eq!(seen["status"], "Uploaded");
        assert_eq!(seen["file_name"], "permit.pdf");
        assert_eq!(seen["file_len"], 13);
    }

    #[tokio::test]
    async fn test_detach_sends_json_body() {
        let seen = Arc::new(parking_lot::Mutex::new(Value::Null));
        let sink = seen.clone();
        let router = Router::new().route(
            "/api/project/professionals",
            axum::routing::delete(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    *sink.lock() = body;
                    StatusCode::NO_CONTENT
                }
            }),
        );
        let api = client(serve(router).await, Some("tok-1"));

        api.detach_professional(&ProjectProfessionalLink {
            project_id: "p1".into(),
            professional_id: "a2".into(),
        })
        .await
        .unwrap();
        assert_eq!(*seen.lock(), json!({"project_id": "p1", "professional_id": "a2"}));
    }

    #[tokio::test]
    async fn test_download_reads_headers() {
        async fn document() -> ([(&'static str, &'static str); 2], &'static [u8]) {
            (
                [
                    ("content-type", "application/pdf"),
                    ("content-disposition", "attachment; filename=\"license.pdf\""),
                ],
                b"%PDF",
            )
        }
        let api = client(
            serve(Router::new().route("/api/professional/document", get(document))).await,
            Some("tok-1"),
        );
        let file = api
            .download_professional_document(&"a1".into(), &"d9".into())
            .await
            .unwrap();
        assert_eq!(file.file_name, "license.pdf");
        assert!(file.is_pdf());
        assert_eq!(&file.data[..], b"%PDF");
    }

    #[tokio::test]
    async fn test_login_and_statuses() {
        let router = Router::new()
            .route(
                "/api/auth/login",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({"access_token": "tok-9", "user_id": 3, "email": body["email"]}))
                }),
            )
            .route(
                "/api/project/statuses",
                get(|| async { Json(json!({"statuses": ["PRE_PERMIT", "Post permit", "draft"]})) }),
            );
        let api = client(serve(router).await, None);

        let login = api
            .login(&LoginRequest {
                email: "dana@build.co.il".into(),
                password: "pw".into(),
            })
            .await
            .unwrap();
        assert_eq!(login.access_token, "tok-9");
        assert_eq!(login.email, "dana@build.co.il");

        let statuses = api.project_statuses().await.unwrap();
        assert_eq!(
            statuses,
            vec![
                ProjectStatus::PrePermit,
                ProjectStatus::PostPermit,
                ProjectStatus::Other("draft".into())
            ]
        );
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport() {
        let api = client("http://127.0.0.1:9/api".into(), None);
        assert!(matches!(api.list_projects().await.unwrap_err(), DcError::Transport(_)));
    }
}
