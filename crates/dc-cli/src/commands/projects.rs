use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use dc_core::{DcError, DcResult, EntityId};
use dc_models::{NewProject, Professional, Project, ProjectAssignment, ProjectStatus};
use dc_queries::sorts::default_project_sort;
use dc_services::assignments::available;
use dc_services::delete::PROJECT_MESSAGE;
use dc_services::{EntityList, FileArea, FileOwner, ProjectDetail};
use serde::Serialize;

use super::{confirm_delete, ListArgs};
use crate::app::App;
use crate::output::{render_fields, render_table, Tabular};

#[derive(Subcommand, Debug)]
pub enum ProjectsCommand {
    /// List projects, newest first unless sorted
    List(ListArgs),
    /// Project details, assigned professionals and files
    Show { id: EntityId },
    Create(CreateArgs),
    Update(UpdateArgs),
    Delete { id: EntityId },
    /// Statuses the backend accepts
    Statuses,
    /// Professionals not yet assigned to a project
    Available { id: EntityId },
    /// Assign a professional to a project
    Attach { id: EntityId, professional: EntityId },
    Detach { id: EntityId, professional: EntityId },
    /// Required document types and what is uploaded for each
    Files { id: EntityId },
    Upload {
        id: EntityId,
        #[arg(long = "type")]
        document_type: Option<String>,
        path: PathBuf,
    },
    Download {
        id: EntityId,
        document: EntityId,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Save the PDF uploaded for a document type
    Preview {
        id: EntityId,
        document_type: String,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    DeleteDocument { id: EntityId, document: EntityId },
    DownloadAll {
        id: EntityId,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub address: String,
    #[arg(long)]
    pub case_id: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub status: Option<ProjectStatus>,
    #[arg(long)]
    pub municipality: Option<EntityId>,
    #[arg(long)]
    pub due_date: Option<NaiveDate>,
    #[arg(long)]
    pub status_due_date: Option<NaiveDate>,
    /// Professional id, repeatable
    #[arg(long = "professional")]
    pub professionals: Vec<EntityId>,
}

/// Only the given flags change
#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: EntityId,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub case_id: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub status: Option<ProjectStatus>,
    #[arg(long)]
    pub municipality: Option<EntityId>,
    #[arg(long)]
    pub due_date: Option<NaiveDate>,
    #[arg(long)]
    pub status_due_date: Option<NaiveDate>,
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
    #[arg(long)]
    pub end_date: Option<NaiveDate>,
    #[arg(long)]
    pub permit_owner: Option<String>,
}

#[derive(Serialize)]
struct ShowView<'a> {
    project: &'a Project,
    statuses: &'a [ProjectStatus],
    files: &'a FileArea,
}

pub async fn run(app: &App, command: ProjectsCommand) -> anyhow::Result<()> {
    app.require_user()?;
    let projects = app.projects();

    match command {
        ProjectsCommand::List(args) => {
            let list = projects.list().await?;
            app.output.page(&list.query(&args.query(Some(default_project_sort()))))
        }
        ProjectsCommand::Show { id } => {
            let (detail, files) = load_detail(app, &id).await?;
            let view = ShowView {
                project: &detail.project,
                statuses: &detail.statuses,
                files: &files,
            };
            app.output.record(&view, || render_project(&detail.project, &files))
        }
        ProjectsCommand::Create(args) => {
            let mut list = EntityList::new(Vec::new());
            let project = NewProject {
                name: args.name,
                case_id: args.case_id,
                description: args.description,
                address: args.address,
                status: args.status,
                municipality_id: args.municipality,
                due_date: args.due_date,
                status_due_date: args.status_due_date,
                professionals: assignments(app, &args.professionals).await?,
            };
            let created = projects.create(&mut list, &project).await?;
            app.output.record(&created, || render_project_fields(&created))
        }
        ProjectsCommand::Update(args) => {
            let original = projects.get(&args.id).await?;
            let mut edited = original.to_update();
            apply_update(&mut edited, args);
            let mut list = EntityList::new(vec![original.clone()]);
            let updated = projects.update(&mut list, &original, edited).await?;
            app.output.record(&updated, || render_project_fields(&updated))
        }
        ProjectsCommand::Delete { id } => {
            let mut list = EntityList::new(Vec::new());
            confirm_delete(app, id, PROJECT_MESSAGE, |id| async move {
                projects.delete(&mut list, &id).await
            })
            .await?;
            Ok(())
        }
        ProjectsCommand::Statuses => {
            let statuses: Vec<String> = projects
                .statuses()
                .await?
                .iter()
                .map(|s| s.as_str().to_string())
                .collect();
            app.output.lines(&statuses)
        }
        ProjectsCommand::Available { id } => {
            let project = projects.get(&id).await?;
            let professionals = app.professionals().list().await?;
            app.output.list(&available(&project, professionals.items()))
        }
        ProjectsCommand::Attach { id, professional } => {
            let mut project = projects.get(&id).await?;
            let professional = app.professionals().get(&professional).await?;
            app.assignments().attach(&mut project, &professional).await?;
            app.output.list(&project.professionals)
        }
        ProjectsCommand::Detach { id, professional } => {
            let mut project = projects.get(&id).await?;
            app.assignments().detach(&mut project, &professional).await?;
            app.output.list(&project.professionals)
        }
        ProjectsCommand::Files { id } => {
            let area = app.files().load(&FileOwner::Project(id)).await?;
            app.output.list(area.entries())
        }
        ProjectsCommand::Upload {
            id,
            document_type,
            path,
        } => {
            let files = app.files();
            let file = app.read_upload(&path).await?;
            let document_type = document_type.unwrap_or_else(|| files.general_type().to_string());
            let area = files
                .upload(&FileOwner::Project(id), &document_type, file)
                .await?;
            app.output.list(area.entries())
        }
        ProjectsCommand::Download { id, document, dir } => {
            let file = app.files().download(&FileOwner::Project(id), &document).await?;
            app.write_download(&dir, &file).await?;
            Ok(())
        }
        ProjectsCommand::Preview {
            id,
            document_type,
            dir,
        } => {
            let files = app.files();
            let owner = FileOwner::Project(id);
            let area = files.load(&owner).await?;
            let Some(entry) = area.entry(&document_type) else {
                let err = DcError::not_found("document type", &document_type);
                return Err(app.ctx.fail(err, "Unknown document type").into());
            };
            let file = files.preview(&owner, entry).await?;
            app.write_download(&dir, &file).await?;
            Ok(())
        }
        ProjectsCommand::DeleteDocument { id, document } => {
            let area = app
                .files()
                .delete(&FileOwner::Project(id), &document)
                .await?;
            app.output.list(area.entries())
        }
        ProjectsCommand::DownloadAll { id, dir } => {
            let files = app.files();
            let owner = FileOwner::Project(id);
            let area = files.load(&owner).await?;
            for file in files.download_all(&owner, &area).await? {
                app.write_download(&dir, &file).await?;
            }
            Ok(())
        }
    }
}

async fn load_detail(app: &App, id: &EntityId) -> DcResult<(ProjectDetail, FileArea)> {
    let projects = app.projects();
    let files = app.files();
    let owner = FileOwner::Project(id.clone());
    futures::try_join!(projects.detail(id), files.load(&owner))
}

/// Resolve professional ids to assignments carrying their type
async fn assignments(app: &App, ids: &[EntityId]) -> DcResult<Vec<ProjectAssignment>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let professionals = app.professionals().list().await?;
    ids.iter()
        .map(|id| {
            professionals
                .get(id)
                .map(|p: &Professional| ProjectAssignment {
                    professional_id: id.clone(),
                    professional_type_id: p.type_id().cloned(),
                })
                .ok_or_else(|| {
                    app.ctx
                        .fail(DcError::not_found("professional", id), "Unknown professional")
                })
        })
        .collect()
}

fn apply_update(edited: &mut dc_models::ProjectUpdate, args: UpdateArgs) {
    if let Some(name) = args.name {
        edited.name = name;
    }
    if let Some(address) = args.address {
        edited.address = address;
    }
    if args.case_id.is_some() {
        edited.case_id = args.case_id;
    }
    if args.description.is_some() {
        edited.description = args.description;
    }
    if args.status.is_some() {
        edited.status = args.status;
    }
    if args.municipality.is_some() {
        edited.municipality_id = args.municipality;
    }
    if args.due_date.is_some() {
        edited.due_date = args.due_date;
    }
    if args.status_due_date.is_some() {
        edited.status_due_date = args.status_due_date;
    }
    if args.start_date.is_some() {
        edited.start_date = args.start_date;
    }
    if args.end_date.is_some() {
        edited.end_date = args.end_date;
    }
    if args.permit_owner.is_some() {
        edited.permit_owner = args.permit_owner;
    }
}

fn render_project_fields(project: &Project) -> String {
    let text = |v: Option<&str>| v.unwrap_or("-").to_string();
    let date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
    render_fields(&[
        ("id", project.id.as_ref().map(|i| i.to_string()).unwrap_or_else(|| "-".into())),
        ("name", project.name.clone()),
        ("case", text(project.case_id.as_deref())),
        ("address", project.address.clone()),
        ("status", text(project.status.as_ref().map(|s| s.label()))),
        (
            "municipality",
            text(
                project
                    .municipality
                    .as_ref()
                    .map(|m| m.name.as_str())
                    .or(project.municipality_id.as_ref().map(|m| m.as_str())),
            ),
        ),
        ("due", date(project.due_date)),
        ("status due", date(project.status_due_date)),
        ("permit owner", text(project.permit_owner.as_deref())),
        ("description", text(project.description.as_deref())),
    ])
}

fn render_project(project: &Project, files: &FileArea) -> String {
    let professionals: Vec<Vec<String>> = project.professionals.iter().map(Tabular::row).collect();
    let entries: Vec<Vec<String>> = files.entries().iter().map(Tabular::row).collect();
    format!(
        "{}\n\nProfessionals\n{}\n\nFiles\n{}",
        render_project_fields(project),
        render_table(&dc_models::ProjectProfessional::headers(), &professionals),
        render_table(&dc_services::FileEntry::headers(), &entries),
    )
}
