use std::path::PathBuf;

use clap::Args;
use dc_core::{DcError, DcResult, EntityId};
use dc_services::{ProjectWizard, WizardService};

use super::parse_pair;
use crate::app::App;

/// Everything the wizard screens ask for, given up front
#[derive(Args, Debug, Default)]
pub struct WizardArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub address: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long)]
    pub case_id: Option<String>,
    #[arg(long)]
    pub municipality: Option<EntityId>,
    /// Professional id, at most one per professional type, repeatable
    #[arg(long = "professional")]
    pub professionals: Vec<EntityId>,
    /// Template id to generate, repeatable
    #[arg(long = "template", conflicts_with = "all_templates")]
    pub templates: Vec<EntityId>,
    /// Generate every template of the municipality
    #[arg(long)]
    pub all_templates: bool,
    /// `TEMPLATE_ID=PATH`: upload the filled-in document for a template
    #[arg(long = "upload", value_parser = parse_pair)]
    pub uploads: Vec<(String, String)>,
}

pub async fn run(app: &App, args: WizardArgs) -> anyhow::Result<()> {
    app.require_user()?;
    let service = app.wizard();
    let mut wizard = service.start().await?;
    announce(app, &wizard);

    {
        let form = wizard.form_mut();
        form.name = args.name;
        form.address = args.address;
        form.description = args.description;
        form.case_id = args.case_id;
    }
    advance(app, &service, &mut wizard)?;

    if let Some(municipality) = &args.municipality {
        service.select_municipality(&mut wizard, municipality).await?;
    }
    advance(app, &service, &mut wizard)?;

    for id in &args.professionals {
        let Some(professional) = wizard
            .professionals()
            .iter()
            .find(|p| p.id.as_ref() == Some(id))
            .cloned()
        else {
            let err = DcError::not_found("professional", id);
            return Err(app.ctx.fail(err, "Unknown professional").into());
        };
        wizard.select_professional(&professional);
    }
    advance(app, &service, &mut wizard)?;

    select_templates(app, &mut wizard, &args.templates, args.all_templates)?;
    let generated = service.submit(&mut wizard).await?.to_vec();
    announce(app, &wizard);

    for (template_id, path) in &args.uploads {
        let template_id = EntityId::from(template_id.as_str());
        let Some(document_id) = generated
            .iter()
            .find(|g| g.template_id.as_ref() == Some(&template_id))
            .and_then(|g| g.id.clone())
        else {
            let err = DcError::not_found("generated document for template", &template_id);
            return Err(app.ctx.fail(err, "Failed to upload document.").into());
        };
        let file = app.read_upload(&PathBuf::from(path)).await?;
        service.upload_document(&mut wizard, &document_id, file).await?;
    }

    app.output.list(wizard.generated())
}

fn announce(app: &App, wizard: &ProjectWizard) {
    app.ctx.info(format!("Step {}", wizard.step()));
}

fn advance(app: &App, service: &WizardService, wizard: &mut ProjectWizard) -> DcResult<()> {
    service.next(wizard)?;
    announce(app, wizard);
    Ok(())
}

fn select_templates(
    app: &App,
    wizard: &mut ProjectWizard,
    ids: &[EntityId],
    all: bool,
) -> DcResult<()> {
    let chosen: Vec<EntityId> = if all {
        wizard.templates().iter().filter_map(|t| t.id.clone()).collect()
    } else {
        ids.to_vec()
    };
    for id in chosen {
        if !wizard.templates().iter().any(|t| t.id.as_ref() == Some(&id)) {
            let err = DcError::not_found("template", &id);
            return Err(app.ctx.fail(err, "Unknown template"));
        }
        if !wizard.form().selected_templates.contains(&id) {
            wizard.toggle_template(id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::signed_in;
    use dc_contracts::wizard::WizardStep;

    async fn wizard_for(app: &App) -> (ProjectWizard, EntityId) {
        let service = app.wizard();
        let mut wizard = service.start().await.unwrap();
        let municipality = wizard.municipalities()[0].id.clone().unwrap();
        service.select_municipality(&mut wizard, &municipality).await.unwrap();
        (wizard, municipality)
    }

    #[tokio::test]
    async fn test_all_templates_selects_every_one() {
        let dir = tempfile::tempdir().unwrap();
        let app = signed_in(dir.path(), false).await;
        let (mut wizard, _) = wizard_for(&app).await;

        select_templates(&app, &mut wizard, &[], true).unwrap();
        assert_eq!(wizard.form().selected_templates.len(), wizard.templates().len());

        // Selecting again keeps them selected
        select_templates(&app, &mut wizard, &[], true).unwrap();
        assert_eq!(wizard.form().selected_templates.len(), wizard.templates().len());
    }

    #[tokio::test]
    async fn test_unknown_template_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = signed_in(dir.path(), false).await;
        let (mut wizard, _) = wizard_for(&app).await;
        assert!(select_templates(&app, &mut wizard, &[EntityId::from("t-999")], false).is_err());
    }

    #[tokio::test]
    async fn test_missing_name_stops_at_first_step() {
        let dir = tempfile::tempdir().unwrap();
        let app = signed_in(dir.path(), false).await;
        let args = WizardArgs {
            address: "Herzl 1".into(),
            ..Default::default()
        };
        let err = run(&app, args).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DcError>(), Some(DcError::Validation(_))));
    }

    #[tokio::test]
    async fn test_full_run_generates_documents() {
        let dir = tempfile::tempdir().unwrap();
        let app = signed_in(dir.path(), false).await;
        let service = app.wizard();
        let (mut wizard, _) = wizard_for(&app).await;
        let template = wizard.templates()[0].clone();
        let professional = wizard
            .professionals()
            .iter()
            .find(|p| p.type_id() == template.professional_type_id.as_ref())
            .cloned()
            .unwrap();

        wizard.form_mut().name = "Neve Tzedek lofts".into();
        wizard.form_mut().address = "Shabazi 12, Tel Aviv".into();
        service.next(&mut wizard).unwrap();
        service.next(&mut wizard).unwrap();
        wizard.select_professional(&professional);
        service.next(&mut wizard).unwrap();
        select_templates(&app, &mut wizard, &[template.id.clone().unwrap()], false).unwrap();

        let generated = service.submit(&mut wizard).await.unwrap().to_vec();
        assert_eq!(generated.len(), 1);
        assert_eq!(wizard.step(), WizardStep::Review);
    }
}
