use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use dc_core::{DcError, DcResult, EntityId};
use dc_models::{NewProfessional, Professional, ProfessionalStatus};
use dc_services::delete::PROFESSIONAL_MESSAGE;
use dc_services::{group_by_type, EntityList, FileOwner, ProfessionalService};

use super::{confirm_delete, ListArgs};
use crate::app::App;
use crate::output::{render_fields, render_table, Tabular};

#[derive(Subcommand, Debug)]
pub enum ProfessionalsCommand {
    List {
        #[command(flatten)]
        list: ListArgs,
        /// One table per professional type
        #[arg(long)]
        grouped: bool,
    },
    Show { id: EntityId },
    Create(ProfessionalArgs),
    /// Read a scanned license and print the prefilled form
    Import {
        path: PathBuf,
        /// Create the professional from the imported data
        #[arg(long)]
        save: bool,
    },
    Update {
        id: EntityId,
        #[command(flatten)]
        changes: ProfessionalChanges,
    },
    Delete { id: EntityId },
    Types,
    Statuses,
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
    DeleteDocument { id: EntityId, document: EntityId },
}

#[derive(Args, Debug, Default)]
pub struct ProfessionalArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long = "type")]
    pub professional_type: String,
    #[arg(long, default_value = "")]
    pub national_id: String,
    #[arg(long, default_value = "")]
    pub email: String,
    #[arg(long, default_value = "")]
    pub phone: String,
    #[arg(long, default_value = "")]
    pub address: String,
    #[arg(long, default_value = "")]
    pub license_number: String,
    /// YYYY-MM-DD
    #[arg(long, default_value = "")]
    pub license_expiration_date: String,
}

impl From<ProfessionalArgs> for NewProfessional {
    fn from(args: ProfessionalArgs) -> Self {
        NewProfessional {
            name: args.name,
            address: args.address,
            phone: args.phone,
            email: args.email,
            professional_type: args.professional_type,
            national_id: args.national_id,
            license_number: args.license_number,
            license_expiration_date: args.license_expiration_date,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct ProfessionalChanges {
    #[arg(long)]
    pub name: Option<String>,
    /// Professional type id
    #[arg(long = "type")]
    pub professional_type: Option<EntityId>,
    #[arg(long)]
    pub national_id: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub license_number: Option<String>,
    #[arg(long)]
    pub license_expiration_date: Option<NaiveDate>,
    #[arg(long)]
    pub status: Option<ProfessionalStatus>,
}

pub async fn run(app: &App, command: ProfessionalsCommand) -> anyhow::Result<()> {
    app.require_user()?;
    let professionals = app.professionals();

    match command {
        ProfessionalsCommand::List { list, grouped } => {
            let all = professionals.list().await?;
            if !grouped {
                return app.output.page(&all.query(&list.query(None)));
            }
            let page = all.query(&list.query(None));
            let groups = group_by_type(&page.items);
            app.output.record(&groups, || {
                groups
                    .iter()
                    .map(|group| {
                        let rows: Vec<Vec<String>> = group.members.iter().map(Tabular::row).collect();
                        format!("{}\n{}", group.label(), render_table(&Professional::headers(), &rows))
                    })
                    .collect::<Vec<_>>()
                    .join("\n\n")
            })
        }
        ProfessionalsCommand::Show { id } => {
            let professional = professionals.get(&id).await?;
            app.output
                .record(&professional, || render_professional(&professional))
        }
        ProfessionalsCommand::Create(args) => {
            let mut list = EntityList::new(Vec::new());
            let created = professionals.create(&mut list, &args.into()).await?;
            app.output.record(&created, || render_professional(&created))
        }
        ProfessionalsCommand::Import { path, save } => {
            let file = app.read_upload(&path).await?;
            let draft = professionals.import(file).await?;
            if save {
                let mut list = EntityList::new(Vec::new());
                let created = professionals.create(&mut list, &draft).await?;
                return app.output.record(&created, || render_professional(&created));
            }
            app.output.record(&draft, || render_draft(&draft))
        }
        ProfessionalsCommand::Update { id, changes } => {
            let original = professionals.get(&id).await?;
            let edited = apply_changes(app, &professionals, &original, changes).await?;
            let mut list = EntityList::new(vec![original]);
            let updated = professionals.update(&mut list, &edited).await?;
            app.output.record(&updated, || render_professional(&updated))
        }
        ProfessionalsCommand::Delete { id } => {
            let mut list = EntityList::new(Vec::new());
            confirm_delete(app, id, PROFESSIONAL_MESSAGE, |id| async move {
                professionals.delete(&mut list, &id).await
            })
            .await?;
            Ok(())
        }
        ProfessionalsCommand::Types => app.output.list(&professionals.types().await?),
        ProfessionalsCommand::Statuses => {
            let statuses: Vec<String> = professionals
                .statuses()
                .await?
                .iter()
                .map(|s| s.to_string())
                .collect();
            app.output.lines(&statuses)
        }
        ProfessionalsCommand::Files { id } => {
            let area = app.files().load(&FileOwner::Professional(id)).await?;
            app.output.list(area.entries())
        }
        ProfessionalsCommand::Upload {
            id,
            document_type,
            path,
        } => {
            let files = app.files();
            let file = app.read_upload(&path).await?;
            let document_type = document_type.unwrap_or_else(|| files.general_type().to_string());
            let area = files
                .upload(&FileOwner::Professional(id), &document_type, file)
                .await?;
            app.output.list(area.entries())
        }
        ProfessionalsCommand::Download { id, document, dir } => {
            let file = app
                .files()
                .download(&FileOwner::Professional(id), &document)
                .await?;
            app.write_download(&dir, &file).await?;
            Ok(())
        }
        ProfessionalsCommand::DeleteDocument { id, document } => {
            let area = app
                .files()
                .delete(&FileOwner::Professional(id), &document)
                .await?;
            app.output.list(area.entries())
        }
    }
}

/// The loaded professional with the given flags applied. A type id is
/// resolved against the type catalog.
async fn apply_changes(
    app: &App,
    service: &ProfessionalService,
    original: &Professional,
    changes: ProfessionalChanges,
) -> DcResult<Professional> {
    let mut edited = original.to_update();
    if let Some(type_id) = changes.professional_type {
        let types = service.types().await?;
        let Some(found) = types.into_iter().find(|t| t.id.as_ref() == Some(&type_id)) else {
            let err = DcError::not_found("professional type", &type_id);
            return Err(app.ctx.fail(err, "Unknown professional type"));
        };
        edited.professional_type = Some(found);
    }
    if let Some(name) = changes.name {
        edited.name = name;
    }
    if changes.national_id.is_some() {
        edited.national_id = changes.national_id;
    }
    if changes.email.is_some() {
        edited.email = changes.email;
    }
    if changes.phone.is_some() {
        edited.phone = changes.phone;
    }
    if changes.address.is_some() {
        edited.address = changes.address;
    }
    if changes.license_number.is_some() {
        edited.license_number = changes.license_number;
    }
    if changes.license_expiration_date.is_some() {
        edited.license_expiration_date = changes.license_expiration_date;
    }
    if changes.status.is_some() {
        edited.status = changes.status;
    }
    Ok(edited)
}

fn render_professional(professional: &Professional) -> String {
    let text = |v: Option<&str>| v.unwrap_or("-").to_string();
    render_fields(&[
        (
            "id",
            professional
                .id
                .as_ref()
                .map(|i| i.to_string())
                .unwrap_or_else(|| "-".into()),
        ),
        ("name", professional.name.clone()),
        ("type", text(professional.type_name())),
        ("national id", text(professional.national_id.as_deref())),
        ("email", text(professional.email.as_deref())),
        ("phone", text(professional.phone.as_deref())),
        ("address", text(professional.address.as_deref())),
        ("license", text(professional.license_number.as_deref())),
        (
            "expires",
            professional
                .license_expiration_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".into()),
        ),
        (
            "status",
            professional
                .status
                .as_ref()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".into()),
        ),
        ("documents", professional.documents.len().to_string()),
    ])
}

fn render_draft(draft: &NewProfessional) -> String {
    render_fields(&[
        ("name", draft.name.clone()),
        ("type", draft.professional_type.clone()),
        ("national id", draft.national_id.clone()),
        ("email", draft.email.clone()),
        ("phone", draft.phone.clone()),
        ("address", draft.address.clone()),
        ("license", draft.license_number.clone()),
        ("expires", draft.license_expiration_date.clone()),
    ])
}
