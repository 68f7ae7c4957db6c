//! Required-versus-uploaded document reconciliation and the file actions
//! on a project or professional page

use std::fmt;
use std::sync::Arc;

use dc_client::{DownloadedFile, ProfessionalsApi, ProjectsApi};
use dc_core::config::DocumentsConfig;
use dc_core::{DcError, DcResult, EntityId, ValidationErrors};
use dc_models::{DocumentUpload, UploadFile, UploadedDocument};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::base::ServiceContext;

pub const PREVIEW_PDF_ONLY: &str = "Preview is only available for PDF files";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    Uploaded,
    Missing,
}

/// One row of a file area: an uploaded document or a placeholder for a
/// required type nobody uploaded yet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEntry {
    pub document_type: String,
    pub state: FileState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<UploadedDocument>,
}

impl FileEntry {
    fn uploaded(document: &UploadedDocument) -> Self {
        Self {
            document_type: document.document_type.clone(),
            state: FileState::Uploaded,
            document: Some(document.clone()),
        }
    }

    fn missing(document_type: &str) -> Self {
        Self {
            document_type: document_type.to_string(),
            state: FileState::Missing,
            document: None,
        }
    }

    pub fn is_uploaded(&self) -> bool {
        self.state == FileState::Uploaded
    }

    pub fn document_id(&self) -> Option<&EntityId> {
        self.document.as_ref().and_then(|d| d.id.as_ref())
    }

    pub fn file_name(&self) -> Option<&str> {
        self.document.as_ref().map(UploadedDocument::display_file_name)
    }

    pub fn can_preview(&self) -> bool {
        self.document.as_ref().is_some_and(UploadedDocument::is_pdf)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileArea {
    pub entries: Vec<FileEntry>,
}

impl FileArea {
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn uploaded(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.iter().filter(|e| e.is_uploaded())
    }

    pub fn missing_types(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| !e.is_uploaded())
            .map(|e| e.document_type.as_str())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(FileEntry::is_uploaded)
    }

    pub fn entry(&self, document_type: &str) -> Option<&FileEntry> {
        self.entries.iter().find(|e| e.document_type == document_type)
    }
}

/// Build the file area for `required_types` from `documents`.
///
/// Required types come first, in their given order and each once. A type
/// shows its first uploaded document, or a missing placeholder. The
/// `general_type`, when given, lists every document of that type instead.
/// Uploaded types outside the required list follow in first-seen order.
pub fn reconcile(
    required_types: &[String],
    documents: &[UploadedDocument],
    general_type: Option<&str>,
) -> FileArea {
    let mut entries = Vec::with_capacity(required_types.len());
    let mut seen: Vec<&str> = Vec::new();

    let push_type = |document_type: &str, entries: &mut Vec<FileEntry>| {
        let mut of_type = documents.iter().filter(|d| d.document_type == document_type);
        if general_type == Some(document_type) {
            let before = entries.len();
            entries.extend(of_type.map(FileEntry::uploaded));
            before != entries.len()
        } else if let Some(first) = of_type.next() {
            entries.push(FileEntry::uploaded(first));
            true
        } else {
            false
        }
    };

    for document_type in required_types {
        if seen.contains(&document_type.as_str()) {
            continue;
        }
        seen.push(document_type);
        if !push_type(document_type, &mut entries) {
            entries.push(FileEntry::missing(document_type));
        }
    }

    for document in documents {
        let document_type = document.document_type.as_str();
        if seen.contains(&document_type) {
            continue;
        }
        seen.push(document_type);
        push_type(document_type, &mut entries);
    }

    FileArea { entries }
}

/// Whose documents a file area shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOwner {
    Project(EntityId),
    Professional(EntityId),
}

impl FileOwner {
    pub fn id(&self) -> &EntityId {
        match self {
            FileOwner::Project(id) | FileOwner::Professional(id) => id,
        }
    }
}

impl fmt::Display for FileOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOwner::Project(id) => write!(f, "project {id}"),
            FileOwner::Professional(id) => write!(f, "professional {id}"),
        }
    }
}

pub struct FileAreaService {
    projects: Arc<dyn ProjectsApi>,
    professionals: Arc<dyn ProfessionalsApi>,
    ctx: ServiceContext,
    general_type: String,
    upload_status: String,
}

impl FileAreaService {
    pub fn new(
        projects: Arc<dyn ProjectsApi>,
        professionals: Arc<dyn ProfessionalsApi>,
        ctx: ServiceContext,
        config: &DocumentsConfig,
    ) -> Self {
        Self {
            projects,
            professionals,
            ctx,
            general_type: config.general_document_type.clone(),
            upload_status: config.default_upload_status.clone(),
        }
    }

    pub fn general_type(&self) -> &str {
        &self.general_type
    }

    async fn fetch(&self, owner: &FileOwner) -> DcResult<FileArea> {
        // Only project file areas gather several files under the general type
        let (documents, types, general_type) = match owner {
            FileOwner::Project(id) => {
                let (project, types) = futures::try_join!(
                    self.projects.get_project(id),
                    self.projects.project_document_types(),
                )?;
                (project.documents, types, Some(self.general_type.as_str()))
            }
            FileOwner::Professional(id) => {
                let (professional, types) = futures::try_join!(
                    self.professionals.get_professional(id),
                    self.professionals.professional_document_types(),
                )?;
                (professional.documents, types, None)
            }
        };
        Ok(reconcile(&types, &documents, general_type))
    }

    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn load(&self, owner: &FileOwner) -> DcResult<FileArea> {
        let area = self
            .ctx
            .report(self.fetch(owner).await, "Failed to load documents")?;
        debug!(entries = area.entries.len(), missing = area.missing_types().len(), "File area loaded");
        Ok(area)
    }

    /// Upload, then reload the area
    #[instrument(skip(self, file), fields(owner = %owner, file = %file.file_name))]
    pub async fn upload(
        &self,
        owner: &FileOwner,
        document_type: &str,
        file: UploadFile,
    ) -> DcResult<FileArea> {
        let is_general = document_type == self.general_type;
        let upload = DocumentUpload::new(document_type, file);
        let result = match owner {
            FileOwner::Project(id) => {
                let upload = upload.with_status(self.upload_status.clone());
                self.projects.upload_project_document(id, upload).await
            }
            FileOwner::Professional(id) => {
                self.professionals
                    .upload_professional_document(id, upload)
                    .await
            }
        };

        if is_general {
            self.ctx.report(result, "Failed to upload file")?;
        } else {
            self.ctx
                .report(result, &format!("Failed to upload {document_type}"))?;
        }
        let area = self.load(owner).await?;
        if is_general {
            self.ctx.success("File uploaded successfully");
        } else {
            self.ctx.success(format!("{document_type} uploaded successfully"));
        }
        Ok(area)
    }

    async fn fetch_file(&self, owner: &FileOwner, document_id: &EntityId) -> DcResult<DownloadedFile> {
        match owner {
            FileOwner::Project(id) => {
                self.projects
                    .download_project_document(id, document_id)
                    .await
            }
            FileOwner::Professional(id) => {
                self.professionals
                    .download_professional_document(id, document_id)
                    .await
            }
        }
    }

    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn download(
        &self,
        owner: &FileOwner,
        document_id: &EntityId,
    ) -> DcResult<DownloadedFile> {
        self.ctx
            .report(self.fetch_file(owner, document_id).await, "Failed to download file")
    }

    /// Fetch a PDF for inline display; other files are refused locally
    #[instrument(skip(self, entry), fields(owner = %owner))]
    pub async fn preview(&self, owner: &FileOwner, entry: &FileEntry) -> DcResult<DownloadedFile> {
        let Some(document_id) = entry.document_id().filter(|_| entry.can_preview()) else {
            let mut errors = ValidationErrors::new();
            errors.add_base(PREVIEW_PDF_ONLY);
            return Err(self.ctx.fail(DcError::Validation(errors), PREVIEW_PDF_ONLY));
        };
        self.ctx
            .report(self.fetch_file(owner, document_id).await, "Failed to preview file")
    }

    /// Delete, then reload the area
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn delete(&self, owner: &FileOwner, document_id: &EntityId) -> DcResult<FileArea> {
        let result = match owner {
            FileOwner::Project(id) => {
                self.projects
                    .delete_project_document(id, document_id)
                    .await
            }
            FileOwner::Professional(id) => {
                self.professionals
                    .delete_professional_document(id, document_id)
                    .await
            }
        };
        self.ctx.report(result, "Failed to delete file")?;
        let area = self.load(owner).await?;
        self.ctx.success("File deleted successfully");
        Ok(area)
    }

    /// Every uploaded file in `area`. A failed file is reported and skipped.
    #[instrument(skip(self, area), fields(owner = %owner))]
    pub async fn download_all(
        &self,
        owner: &FileOwner,
        area: &FileArea,
    ) -> DcResult<Vec<DownloadedFile>> {
        let uploaded: Vec<&FileEntry> = area.uploaded().collect();
        if uploaded.is_empty() {
            self.ctx.info("No files to download");
            return Ok(Vec::new());
        }

        let mut files = Vec::with_capacity(uploaded.len());
        for entry in &uploaded {
            let Some(document_id) = entry.document_id() else {
                continue;
            };
            match self.fetch_file(owner, document_id).await {
                Ok(file) => files.push(file),
                Err(err) => {
                    warn!(error = %err, document = %document_id, "Download failed");
                    let name = entry.file_name().unwrap_or(&entry.document_type);
                    self.ctx.fail(err, &format!("Failed to download {name}"));
                }
            }
        }
        self.ctx
            .success(format!("Downloading {} files", uploaded.len()));
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::CollectingNotifier;
    use dc_client::MemoryApi;
    use dc_models::GENERAL_DOCUMENT_TYPE;

    fn doc(id: &str, document_type: &str, name: &str) -> UploadedDocument {
        UploadedDocument {
            id: Some(EntityId::from(id)),
            document_type: document_type.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    fn types(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_one_entry_per_required_type() {
        let required = types(&["permit", "survey", "insurance"]);
        let documents = vec![doc("d1", "survey", "survey-v2.pdf"), doc("d2", "survey", "survey-v1.pdf")];

        let area = reconcile(&required, &documents, Some(GENERAL_DOCUMENT_TYPE));
        let listed: Vec<(&str, FileState)> = area
            .entries()
            .iter()
            .map(|e| (e.document_type.as_str(), e.state))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("permit", FileState::Missing),
                ("survey", FileState::Uploaded),
                ("insurance", FileState::Missing),
            ]
        );
        assert_eq!(area.entry("survey").unwrap().file_name(), Some("survey-v2.pdf"));
        assert_eq!(area.missing_types(), vec!["permit", "insurance"]);
        assert!(!area.is_complete());
    }

    #[test]
    fn test_duplicate_required_types_collapse() {
        let required = types(&["permit", "permit"]);
        let area = reconcile(&required, &[], Some(GENERAL_DOCUMENT_TYPE));
        assert_eq!(area.entries().len(), 1);
    }

    #[test]
    fn test_general_type_lists_everything() {
        let required = types(&["permit", GENERAL_DOCUMENT_TYPE]);
        let documents = vec![
            doc("d1", GENERAL_DOCUMENT_TYPE, "photo1.jpg"),
            doc("d2", "permit", "permit.pdf"),
            doc("d3", GENERAL_DOCUMENT_TYPE, "photo2.jpg"),
        ];

        let area = reconcile(&required, &documents, Some(GENERAL_DOCUMENT_TYPE));
        assert_eq!(area.entries().len(), 3);
        assert!(area.is_complete());
        let general: Vec<&str> = area
            .entries()
            .iter()
            .filter(|e| e.document_type == GENERAL_DOCUMENT_TYPE)
            .filter_map(FileEntry::file_name)
            .collect();
        assert_eq!(general, vec!["photo1.jpg", "photo2.jpg"]);
    }

    #[test]
    fn test_without_general_type_first_document_wins() {
        let required = types(&[GENERAL_DOCUMENT_TYPE]);
        let documents = vec![
            doc("d1", GENERAL_DOCUMENT_TYPE, "photo1.jpg"),
            doc("d2", GENERAL_DOCUMENT_TYPE, "photo2.jpg"),
        ];

        let area = reconcile(&required, &documents, None);
        assert_eq!(area.entries().len(), 1);
        assert_eq!(area.entries()[0].file_name(), Some("photo1.jpg"));
    }

    #[test]
    fn test_unrequired_uploads_are_appended() {
        let required = types(&["permit"]);
        let documents = vec![doc("d1", "legacy", "old.pdf"), doc("d2", "legacy", "older.pdf")];

        let area = reconcile(&required, &documents, Some(GENERAL_DOCUMENT_TYPE));
        assert_eq!(area.entries().len(), 2);
        assert_eq!(area.entries()[1].document_type, "legacy");
        assert_eq!(area.entries()[1].file_name(), Some("old.pdf"));
    }

    #[test]
    fn test_preview_eligibility() {
        let pdf = FileEntry::uploaded(&doc("d1", "permit", "permit.pdf"));
        let scan = FileEntry::uploaded(&doc("d2", "permit", "scan.jpg"));
        assert!(pdf.can_preview());
        assert!(!scan.can_preview());
        assert!(!FileEntry::missing("permit").can_preview());
    }

    fn service() -> (FileAreaService, Arc<MemoryApi>, Arc<CollectingNotifier>) {
        let api = Arc::new(MemoryApi::seeded());
        let notifier = CollectingNotifier::shared();
        let service = FileAreaService::new(
            api.clone(),
            api.clone(),
            ServiceContext::new(notifier.clone()),
            &DocumentsConfig::default(),
        );
        (service, api, notifier)
    }

    async fn first_project(api: &MemoryApi) -> FileOwner {
        let project = api.list_projects().await.unwrap().remove(0);
        FileOwner::Project(project.id.unwrap())
    }

    #[tokio::test]
    async fn test_upload_reload_and_delete() {
        let (service, api, notifier) = service();
        let owner = first_project(&api).await;
        let document_type = dc_models::PROJECT_DOCUMENT_TYPES[0];

        let area = service.load(&owner).await.unwrap();
        assert_eq!(area.missing_types().len(), dc_models::PROJECT_DOCUMENT_TYPES.len());

        let area = service
            .upload(
                &owner,
                document_type,
                UploadFile::from_bytes("appointment.pdf", b"%PDF-1.7".to_vec()),
            )
            .await
            .unwrap();
        let entry = area.entry(document_type).unwrap().clone();
        assert!(entry.is_uploaded());
        assert_eq!(
            notifier.last().unwrap().message,
            format!("{document_type} uploaded successfully")
        );

        let preview = service.preview(&owner, &entry).await.unwrap();
        assert!(preview.is_pdf());

        let area = service
            .delete(&owner, entry.document_id().unwrap())
            .await
            .unwrap();
        assert!(!area.entry(document_type).unwrap().is_uploaded());
        assert_eq!(notifier.last().unwrap().message, "File deleted successfully");
    }

    #[tokio::test]
    async fn test_preview_refuses_non_pdf() {
        let (service, api, notifier) = service();
        let owner = first_project(&api).await;
        let area = service
            .upload(
                &owner,
                GENERAL_DOCUMENT_TYPE,
                UploadFile::from_bytes("site.jpg", vec![0xFF, 0xD8]),
            )
            .await
            .unwrap();
        assert_eq!(notifier.last().unwrap().message, "File uploaded successfully");

        let entry = area.entry(GENERAL_DOCUMENT_TYPE).unwrap();
        assert!(service.preview(&owner, entry).await.is_err());
        assert_eq!(notifier.last().unwrap().message, PREVIEW_PDF_ONLY);
        assert_eq!(api.call_count("download_project_document"), 0);
    }

    #[tokio::test]
    async fn test_download_all() {
        let (service, api, notifier) = service();
        let owner = first_project(&api).await;

        let empty = service.load(&owner).await.unwrap();
        assert!(service.download_all(&owner, &empty).await.unwrap().is_empty());
        assert_eq!(notifier.last().unwrap().message, "No files to download");

        for (name, document_type) in [("a.pdf", "כללי"), ("b.pdf", "כללי")] {
            service
                .upload(&owner, document_type, UploadFile::from_bytes(name, b"%PDF".to_vec()))
                .await
                .unwrap();
        }
        let area = service.load(&owner).await.unwrap();
        let files = service.download_all(&owner, &area).await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(notifier.last().unwrap().message, "Downloading 2 files");
    }

    #[tokio::test]
    async fn test_professional_area_keeps_one_general_document() {
        let (service, api, _) = service();
        let professional = api.list_professionals().await.unwrap().remove(0);
        let owner = FileOwner::Professional(professional.id.unwrap());

        for name in ["site1.pdf", "site2.pdf"] {
            service
                .upload(&owner, GENERAL_DOCUMENT_TYPE, UploadFile::from_bytes(name, b"%PDF".to_vec()))
                .await
                .unwrap();
        }
        let area = service.load(&owner).await.unwrap();
        let general = area
            .entries()
            .iter()
            .filter(|e| e.document_type == GENERAL_DOCUMENT_TYPE)
            .count();
        assert_eq!(general, 1);
    }

    #[tokio::test]
    async fn test_professional_upload_failure() {
        let (service, api, notifier) = service();
        let professional = api.list_professionals().await.unwrap().remove(0);
        let owner = FileOwner::Professional(professional.id.unwrap());
        api.fail_on("upload_professional_document", 413, "File too large");

        let result = service
            .upload(&owner, "license", UploadFile::from_bytes("license.pdf", b"%PDF".to_vec()))
            .await;
        assert!(result.is_err());
        assert_eq!(
            notifier.last().unwrap().message,
            "File too large [Status: 413]"
        );
    }
}
