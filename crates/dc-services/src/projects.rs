//! Project flows: list, detail, create, update and delete

use std::sync::Arc;

use dc_client::ProjectsApi;
use dc_contracts::projects::{CreateProjectContract, UpdateProjectContract};
use dc_core::{DcResult, EntityId};
use dc_models::{NewProject, Project, ProjectStatus, ProjectUpdate};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::base::ServiceContext;
use crate::list::EntityList;

pub const LOAD_FAILED: &str = "Failed to load data. Please try again.";
pub const LIST_FAILED: &str = "Failed to load projects";
pub const CREATE_FAILED: &str = "Failed to create project";
pub const UPDATE_FAILED: &str = "Failed to save changes";
pub const DELETE_FAILED: &str = "Failed to delete project";

/// Everything the project page needs on first render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDetail {
    pub project: Project,
    pub statuses: Vec<ProjectStatus>,
    pub document_types: Vec<String>,
}

pub struct ProjectService {
    api: Arc<dyn ProjectsApi>,
    ctx: ServiceContext,
}

impl ProjectService {
    pub fn new(api: Arc<dyn ProjectsApi>, ctx: ServiceContext) -> Self {
        Self { api, ctx }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> DcResult<EntityList<Project>> {
        let projects = self.ctx.report(self.api.list_projects().await, LIST_FAILED)?;
        debug!(count = projects.len(), "Loaded projects");
        Ok(EntityList::new(projects))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &EntityId) -> DcResult<Project> {
        self.ctx
            .report(self.api.get_project(id).await, "Failed to load project")
    }

    /// Project, status catalog and document types, fetched concurrently
    #[instrument(skip(self))]
    pub async fn detail(&self, id: &EntityId) -> DcResult<ProjectDetail> {
        let loaded = futures::try_join!(
            self.api.get_project(id),
            self.api.project_statuses(),
            self.api.project_document_types(),
        );
        let (project, statuses, document_types) = self.ctx.report(loaded, LOAD_FAILED)?;
        Ok(ProjectDetail {
            project,
            statuses,
            document_types,
        })
    }

    #[instrument(skip(self))]
    pub async fn statuses(&self) -> DcResult<Vec<ProjectStatus>> {
        self.ctx.report(self.api.project_statuses().await, LOAD_FAILED)
    }

    /// Validate, create, then add the new project to `list`
    #[instrument(skip(self, list, project), fields(name = %project.name))]
    pub async fn create(
        &self,
        list: &mut EntityList<Project>,
        project: &NewProject,
    ) -> DcResult<Project> {
        self.ctx.validate(&CreateProjectContract::new(), project)?;

        let created = self
            .ctx
            .report(self.api.create_project(project).await, CREATE_FAILED)?;
        info!(id = ?created.id, "Project created");
        self.ctx.success("Project created successfully");
        list.upsert(created.clone());
        Ok(created)
    }

    /// Save `edited` over `original`.
    ///
    /// Assigned professionals and documents never travel with an update.
    /// A permit owner left empty keeps the loaded one.
    #[instrument(skip_all, fields(id = ?original.id))]
    pub async fn update(
        &self,
        list: &mut EntityList<Project>,
        original: &Project,
        mut edited: ProjectUpdate,
    ) -> DcResult<Project> {
        if edited.permit_owner.as_deref().map_or(true, |o| o.trim().is_empty()) {
            edited.permit_owner = original.permit_owner.clone();
        }

        let contract = UpdateProjectContract::between(&original.to_update(), &edited);
        self.ctx.validate(&contract, &edited)?;
        if !contract.has_changes() {
            self.ctx.info("No changes to save");
            return Ok(original.clone());
        }

        let mut updated = self
            .ctx
            .report(self.api.update_project(&edited).await, UPDATE_FAILED)?;
        if updated.professionals.is_empty() {
            updated.professionals = original.professionals.clone();
        }
        if updated.documents.is_empty() {
            updated.documents = original.documents.clone();
        }
        self.ctx.success("Changes saved");
        list.upsert(updated.clone());
        Ok(updated)
    }

    /// One DELETE; on success exactly one matching row leaves `list`
    #[instrument(skip(self, list))]
    pub async fn delete(&self, list: &mut EntityList<Project>, id: &EntityId) -> DcResult<()> {
        self.ctx
            .report(self.api.delete_project(id).await, DELETE_FAILED)?;
        list.remove(id);
        self.ctx.success("Project deleted");
        Ok(())
    }
}
