//! DocConstruct command-line client
//!
//! Drives the same flows as the web screens: projects, professionals,
//! municipalities, the new-project wizard, survey search and user
//! management.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dc_core::config::{ClientConfig, LoggingConfig};
use dc_core::DcError;

mod app;
mod commands;
mod output;

use app::App;
use commands::{
    auth::PasswordArgs, municipalities::MunicipalitiesCommand, professionals::ProfessionalsCommand,
    projects::ProjectsCommand, survey::SurveyCommand, users::UsersCommand, wizard::WizardArgs,
};
use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "docconstruct", version, about = "DocConstruct permitting admin client")]
pub struct Cli {
    /// Config file (toml, yaml or json)
    #[arg(long, global = true, env = "DOCCONSTRUCT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend base URL, overrides the config file
    #[arg(long, global = true, env = "DOCCONSTRUCT_API_URL")]
    pub api_url: Option<String>,

    /// Use the in-process sample backend instead of the network
    #[arg(long, global = true)]
    pub offline: bool,

    #[arg(long, short, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Skip delete confirmations
    #[arg(long, short, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "DOCCONSTRUCT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Clear the stored session
    Logout,
    /// Show the signed-in user after validating the session
    Whoami,
    /// Change the signed-in user's password
    Password(PasswordArgs),
    #[command(subcommand)]
    Projects(ProjectsCommand),
    #[command(subcommand)]
    Professionals(ProfessionalsCommand),
    #[command(subcommand)]
    Municipalities(MunicipalitiesCommand),
    /// Create a project step by step and generate its documents
    Wizard(WizardArgs),
    #[command(subcommand)]
    Survey(SurveyCommand),
    /// Manage user accounts (admin only)
    #[command(subcommand)]
    Users(UsersCommand),
    /// Sidebar entries for the signed-in user, or check one route
    Nav {
        #[arg(long)]
        check: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
        config.validate()?;
    }
    init_tracing(&config.logging);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.api.base_url,
        offline = cli.offline,
        "Starting DocConstruct CLI"
    );

    let app = App::build(config, cli.offline, cli.output, cli.yes)?;
    match commands::run(&app, cli.command).await {
        Ok(()) => Ok(()),
        // Already printed through the notifier
        Err(err) if err.downcast_ref::<DcError>().is_some() => {
            tracing::debug!(error = %err, "Command failed");
            std::process::exit(1);
        }
        Err(err) => Err(err),
    }
}

/// Logs go to stderr; `RUST_LOG` wins over the configured filter
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.filter.as_str().into());

    let json = logging.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text = (!logging.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "docconstruct",
            "projects",
            "list",
            "--offline",
            "--output",
            "json",
        ])
        .unwrap();
        assert!(cli.offline);
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(matches!(cli.command, Command::Projects(ProjectsCommand::List(_))));
    }

    #[test]
    fn test_login_requires_email() {
        assert!(Cli::try_parse_from(["docconstruct", "login", "--password", "x"]).is_err());
    }

    #[test]
    fn test_nav_check() {
        let cli = Cli::try_parse_from(["docconstruct", "nav", "--check", "/settings"]).unwrap();
        match cli.command {
            Command::Nav { check } => assert_eq!(check.as_deref(), Some("/settings")),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
