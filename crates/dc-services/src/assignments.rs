//! Attaching professionals to a project

use std::sync::Arc;

use dc_client::ProjectsApi;
use dc_core::{DcError, DcResult, EntityId};
use dc_models::{Professional, Project, ProjectProfessional, ProjectProfessionalLink};
use tracing::{instrument, warn};

use crate::base::ServiceContext;

pub const ATTACH_FAILED: &str = "Failed to add professional to project";
pub const DETACH_FAILED: &str = "Failed to remove professional from project";
pub const RELOAD_FAILED: &str = "Failed to reload project data";

/// Professionals that can still be attached to `project`
pub fn available(project: &Project, professionals: &[Professional]) -> Vec<Professional> {
    professionals
        .iter()
        .filter(|p| p.id.as_ref().map_or(false, |id| !project.has_professional(id)))
        .cloned()
        .collect()
}

pub struct AssignmentService {
    api: Arc<dyn ProjectsApi>,
    ctx: ServiceContext,
}

impl AssignmentService {
    pub fn new(api: Arc<dyn ProjectsApi>, ctx: ServiceContext) -> Self {
        Self { api, ctx }
    }

    fn link(project: &Project, professional_id: &EntityId) -> DcResult<ProjectProfessionalLink> {
        let project_id = project
            .id
            .clone()
            .ok_or_else(|| DcError::not_found("project", "<unsaved>"))?;
        Ok(ProjectProfessionalLink {
            project_id,
            professional_id: professional_id.clone(),
        })
    }

    /// Attach, then reload the project. When the reload fails the
    /// professional is added locally instead.
    #[instrument(skip_all, fields(project = ?project.id, professional = ?professional.id))]
    pub async fn attach(&self, project: &mut Project, professional: &Professional) -> DcResult<()> {
        let professional_id = professional
            .id
            .clone()
            .ok_or_else(|| DcError::not_found("professional", "<unsaved>"))?;
        let link = self.ctx.report(Self::link(project, &professional_id), ATTACH_FAILED)?;
        self.ctx
            .report(self.api.attach_professional(&link).await, ATTACH_FAILED)?;

        match self.api.get_project(&link.project_id).await {
            Ok(reloaded) => *project = reloaded,
            Err(err) => {
                warn!(error = %err, "Reload after attach failed");
                self.ctx.fail(err, RELOAD_FAILED);
                project
                    .professionals
                    .push(ProjectProfessional::from(professional.clone()));
            }
        }
        self.ctx.success("Professional added to project");
        Ok(())
    }

    /// Detach; on success exactly one matching assignment leaves `project`
    #[instrument(skip(self, project), fields(project = ?project.id))]
    pub async fn detach(&self, project: &mut Project, professional_id: &EntityId) -> DcResult<()> {
        let link = self.ctx.report(Self::link(project, professional_id), DETACH_FAILED)?;
        self.ctx
            .report(self.api.detach_professional(&link).await, DETACH_FAILED)?;

        if let Some(index) = project
            .professionals
            .iter()
            .position(|pp| pp.professional_id() == Some(professional_id))
        {
            project.professionals.remove(index);
        }
        self.ctx.success("Professional removed from project");
        Ok(())
    }
}
