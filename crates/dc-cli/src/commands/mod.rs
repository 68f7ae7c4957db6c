//! Command handlers

use std::io::{self, BufRead, Write};

use dc_core::{DcResult, EntityId, PageRequest};
use dc_queries::{FieldFilter, ListQuery, SortState};
use dc_services::DeleteFlow;

use crate::app::App;
use crate::Command;

pub mod auth;
pub mod municipalities;
pub mod nav;
pub mod professionals;
pub mod projects;
pub mod survey;
pub mod users;
pub mod wizard;

pub async fn run(app: &App, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => auth::login(app, &email, &password).await,
        Command::Logout => auth::logout(app),
        Command::Whoami => auth::whoami(app).await,
        Command::Password(args) => auth::change_password(app, args).await,
        Command::Projects(cmd) => projects::run(app, cmd).await,
        Command::Professionals(cmd) => professionals::run(app, cmd).await,
        Command::Municipalities(cmd) => municipalities::run(app, cmd).await,
        Command::Wizard(args) => wizard::run(app, args).await,
        Command::Survey(cmd) => survey::run(app, cmd).await,
        Command::Users(cmd) => users::run(app, cmd).await,
        Command::Nav { check } => nav::run(app, check.as_deref()),
    }
}

/// Search, filter, sort and page flags shared by the list commands
#[derive(clap::Args, Debug, Default)]
pub struct ListArgs {
    /// Free-text search across the searchable columns
    #[arg(long, short)]
    pub search: Option<String>,
    /// `column=value`, repeatable
    #[arg(long = "filter", short, value_parser = parse_filter)]
    pub filters: Vec<FieldFilter>,
    /// `column`, `column:desc` or `-column`
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    #[arg(long, default_value_t = 20)]
    pub per_page: usize,
}

impl ListArgs {
    pub fn query(&self, default_sort: Option<SortState>) -> ListQuery {
        let mut query = ListQuery::new();
        if let Some(search) = &self.search {
            query = query.search(search);
        }
        for filter in &self.filters {
            query = query.only(filter.clone());
        }
        if let Some(sort) = self.sort.as_deref().and_then(SortState::parse).or(default_sort) {
            query = query.sort(sort);
        }
        query.page(PageRequest {
            page: self.page,
            per_page: self.per_page,
        })
    }
}

fn parse_filter(raw: &str) -> Result<FieldFilter, String> {
    FieldFilter::parse(raw).ok_or_else(|| format!("expected column=value, got `{raw}`"))
}

/// Ask before deleting unless `--yes` was given
pub async fn confirm_delete<F, Fut>(
    app: &App,
    id: EntityId,
    message: &str,
    delete: F,
) -> DcResult<bool>
where
    F: FnOnce(EntityId) -> Fut,
    Fut: std::future::Future<Output = DcResult<()>>,
{
    let mut flow = DeleteFlow::new();
    let prompt = flow.request(id, Some(message)).to_string();
    if !app.assume_yes && !ask(&prompt) {
        flow.cancel();
        app.ctx.info("Cancelled");
        return Ok(false);
    }
    flow.confirm(delete).await
}

fn ask(prompt: &str) -> bool {
    eprint!("{prompt} [y/N] ");
    if io::stderr().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

/// `KEY=VALUE` pairs such as `t-3=./filled.pdf`
pub fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::offline_app;
    use dc_core::DcError;
    use dc_services::delete::PROJECT_MESSAGE;

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("t-3=./filled.pdf").unwrap(),
            ("t-3".to_string(), "./filled.pdf".to_string())
        );
        assert!(parse_pair("t-3=").is_err());
        assert!(parse_pair("nothing").is_err());
    }

    #[test]
    fn test_bad_filter_is_rejected() {
        assert!(parse_filter("status").is_err());
        assert!(parse_filter("status=FINAL").is_ok());
    }

    #[tokio::test]
    async fn test_yes_skips_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let app = offline_app(dir.path());
        let ran = confirm_delete(&app, EntityId::from("p-1"), PROJECT_MESSAGE, |id| async move {
            assert_eq!(id.as_str(), "p-1");
            Ok::<(), DcError>(())
        })
        .await
        .unwrap();
        assert!(ran);
    }
}
