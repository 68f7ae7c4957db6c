use std::path::PathBuf;

use clap::{Args, Subcommand};
use dc_core::EntityId;
use dc_models::{DocumentTemplate, Municipality, NewMunicipality, NewTemplate};
use dc_services::delete::{MUNICIPALITY_MESSAGE, TEMPLATE_MESSAGE};
use dc_services::EntityList;

use super::{confirm_delete, ListArgs};
use crate::app::App;
use crate::output::{render_fields, render_table, Tabular};

#[derive(Subcommand, Debug)]
pub enum MunicipalitiesCommand {
    List(ListArgs),
    Show { id: EntityId },
    /// Create a municipality, then upload its templates
    Create {
        #[command(flatten)]
        details: MunicipalityArgs,
        /// `NAME:PROFESSIONAL_TYPE_ID:PATH`, repeatable
        #[arg(long = "template", value_parser = TemplateSpec::parse)]
        templates: Vec<TemplateSpec>,
    },
    Update {
        id: EntityId,
        #[command(flatten)]
        details: MunicipalityChanges,
    },
    Delete { id: EntityId },
    Templates {
        #[arg(long)]
        municipality: Option<EntityId>,
    },
    AddTemplate(TemplateArgs),
    DeleteTemplate { id: EntityId },
}

#[derive(Args, Debug, Default)]
pub struct MunicipalityArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub state: Option<String>,
    #[arg(long)]
    pub county: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub contact_person: Option<String>,
    #[arg(long)]
    pub contact_email: Option<String>,
    #[arg(long)]
    pub contact_phone: Option<String>,
    #[arg(long)]
    pub website: Option<String>,
}

impl From<MunicipalityArgs> for NewMunicipality {
    fn from(args: MunicipalityArgs) -> Self {
        NewMunicipality {
            name: args.name,
            state: args.state,
            county: args.county,
            address: args.address,
            contact_person: args.contact_person,
            contact_email: args.contact_email,
            contact_phone: args.contact_phone,
            website: args.website,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct MunicipalityChanges {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub state: Option<String>,
    #[arg(long)]
    pub county: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub contact_person: Option<String>,
    #[arg(long)]
    pub contact_email: Option<String>,
    #[arg(long)]
    pub contact_phone: Option<String>,
    #[arg(long)]
    pub website: Option<String>,
}

impl MunicipalityChanges {
    fn apply(self, data: &mut NewMunicipality) {
        if let Some(name) = self.name {
            data.name = name;
        }
        let fields = [
            (self.state, &mut data.state),
            (self.county, &mut data.county),
            (self.address, &mut data.address),
            (self.contact_person, &mut data.contact_person),
            (self.contact_email, &mut data.contact_email),
            (self.contact_phone, &mut data.contact_phone),
            (self.website, &mut data.website),
        ];
        for (change, field) in fields {
            if change.is_some() {
                *field = change;
            }
        }
    }
}

#[derive(Args, Debug)]
pub struct TemplateArgs {
    pub municipality: EntityId,
    #[arg(long)]
    pub name: String,
    /// Professional type id the template is filled for
    #[arg(long = "type")]
    pub professional_type: Option<EntityId>,
    #[arg(long)]
    pub description: Option<String>,
    /// Field the generated document must fill, repeatable
    #[arg(long = "field")]
    pub required_fields: Vec<String>,
    pub path: PathBuf,
}

/// A template given inline to `create`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSpec {
    pub name: String,
    pub professional_type: EntityId,
    pub path: PathBuf,
}

impl TemplateSpec {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut parts = raw.splitn(3, ':').map(str::trim);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(type_id), Some(path))
                if !name.is_empty() && !type_id.is_empty() && !path.is_empty() =>
            {
                Ok(Self {
                    name: name.to_string(),
                    professional_type: EntityId::from(type_id),
                    path: PathBuf::from(path),
                })
            }
            _ => Err(format!("expected NAME:PROFESSIONAL_TYPE_ID:PATH, got `{raw}`")),
        }
    }
}

pub async fn run(app: &App, command: MunicipalitiesCommand) -> anyhow::Result<()> {
    app.require_user()?;
    let municipalities = app.municipalities();

    match command {
        MunicipalitiesCommand::List(args) => {
            let list = municipalities.list().await?;
            app.output.page(&list.query(&args.query(None)))
        }
        MunicipalitiesCommand::Show { id } => {
            let municipality = municipalities.get(&id).await?;
            app.output
                .record(&municipality, || render_municipality(&municipality))
        }
        MunicipalitiesCommand::Create { details, templates } => {
            // Files are read first so a bad path creates nothing
            let mut uploads = Vec::with_capacity(templates.len());
            for spec in templates {
                let file = app.read_upload(&spec.path).await?;
                uploads.push((spec, file));
            }

            let mut setup = municipalities.setup();
            setup.create_municipality(&details.into()).await?;
            for (spec, file) in uploads {
                let template = NewTemplate {
                    name: spec.name,
                    professional_type_id: Some(spec.professional_type),
                    file: Some(file),
                    ..Default::default()
                };
                setup.add_template(template).await?;
            }

            let Some((mut created, added)) = setup.finish() else {
                return Ok(());
            };
            created.templates = added;
            app.output.record(&created, || render_municipality(&created))
        }
        MunicipalitiesCommand::Update { id, details } => {
            let original = municipalities.get(&id).await?;
            let mut data = original.to_update();
            details.apply(&mut data);
            let mut list = EntityList::new(vec![original]);
            let updated = municipalities.update(&mut list, &id, &data).await?;
            app.output.record(&updated, || render_municipality(&updated))
        }
        MunicipalitiesCommand::Delete { id } => {
            let mut list = EntityList::new(Vec::new());
            confirm_delete(app, id, MUNICIPALITY_MESSAGE, |id| async move {
                municipalities.delete(&mut list, &id).await
            })
            .await?;
            Ok(())
        }
        MunicipalitiesCommand::Templates { municipality } => {
            let templates = municipalities.templates(municipality.as_ref()).await?;
            app.output.list(&templates)
        }
        MunicipalitiesCommand::AddTemplate(args) => {
            let file = app.read_upload(&args.path).await?;
            let template = NewTemplate {
                name: args.name,
                description: args.description,
                professional_type_id: args.professional_type,
                municipality_id: Some(args.municipality),
                required_fields: args.required_fields,
                file: Some(file),
            };
            let created = municipalities.add_template(&template).await?;
            app.output.list(std::slice::from_ref(&created))
        }
        MunicipalitiesCommand::DeleteTemplate { id } => {
            confirm_delete(app, id, TEMPLATE_MESSAGE, |id| async move {
                municipalities.delete_template(&id).await
            })
            .await?;
            Ok(())
        }
    }
}

fn render_municipality(municipality: &Municipality) -> String {
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".into());
    let rows: Vec<Vec<String>> = municipality.templates.iter().map(Tabular::row).collect();
    format!(
        "{}\n\nTemplates\n{}",
        render_fields(&[
            (
                "id",
                municipality
                    .id
                    .as_ref()
                    .map(|i| i.to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
            ("name", municipality.name.clone()),
            ("state", text(&municipality.state)),
            ("county", text(&municipality.county)),
            ("address", text(&municipality.address)),
            ("contact", text(&municipality.contact_person)),
            ("email", text(&municipality.contact_email)),
            ("phone", text(&municipality.contact_phone)),
            ("website", text(&municipality.website)),
        ]),
        render_table(&DocumentTemplate::headers(), &rows),
    )
}
