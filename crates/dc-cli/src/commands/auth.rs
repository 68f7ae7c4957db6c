use clap::Args;
use dc_auth::AuthState;
use dc_core::DcError;
use dc_models::PasswordChange;
use serde::Serialize;

use crate::app::App;
use crate::output::render_fields;

#[derive(Args, Debug)]
pub struct PasswordArgs {
    #[arg(long, env = "DOCCONSTRUCT_PASSWORD", hide_env_values = true)]
    pub current: String,
    #[arg(long)]
    pub new: String,
    #[arg(long)]
    pub confirm: String,
}

#[derive(Debug, Serialize)]
struct WhoAmI<'a> {
    email: &'a str,
    roles: &'a [String],
    admin: bool,
    landing: &'static str,
}

pub async fn login(app: &App, email: &str, password: &str) -> anyhow::Result<()> {
    let redirect = app
        .ctx
        .report(app.auth.login(email, password).await, "Login failed")?;
    app.ctx.success(format!("Signed in as {}", email.trim()));
    tracing::debug!(landing = redirect.path(), "Login redirect");
    Ok(())
}

pub fn logout(app: &App) -> anyhow::Result<()> {
    let redirect = app.auth.logout();
    app.ctx.info("Signed out");
    tracing::debug!(landing = redirect.path(), "Logout redirect");
    Ok(())
}

/// Validates the stored session against the backend, like a page load
pub async fn whoami(app: &App) -> anyhow::Result<()> {
    let user = match app.auth.initialize().await {
        AuthState::Authenticated(user) => user,
        AuthState::LoggedOut(redirect) => {
            let err = DcError::Unauthorized {
                message: format!("Not signed in (go to {})", redirect.path()),
            };
            return Err(app.ctx.fail(err, "Not signed in").into());
        }
    };

    let view = WhoAmI {
        email: &user.email,
        roles: &user.roles,
        admin: user.is_admin(),
        landing: dc_auth::permissions::HOME_PATH,
    };
    app.output.record(&view, || {
        render_fields(&[
            ("email", view.email.to_string()),
            ("roles", view.roles.join(", ")),
            ("admin", view.admin.to_string()),
        ])
    })
}

pub async fn change_password(app: &App, args: PasswordArgs) -> anyhow::Result<()> {
    app.require_user()?;
    let change = PasswordChange {
        current_password: args.current,
        new_password: args.new,
        confirm_password: args.confirm,
    };
    app.accounts().change_password(&change).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::{offline_app, signed_in};

    #[tokio::test]
    async fn test_login_then_whoami() {
        let dir = tempfile::tempdir().unwrap();
        let app = offline_app(dir.path());
        assert!(whoami(&app).await.is_err());

        login(&app, "clerk@docconstruct.local", "clerk1234").await.unwrap();
        whoami(&app).await.unwrap();

        logout(&app).unwrap();
        assert!(app.auth.current_user().is_none());
    }

    #[tokio::test]
    async fn test_bad_login_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let app = offline_app(dir.path());
        let err = login(&app, "clerk@docconstruct.local", "nope").await.unwrap_err();
        assert!(err.downcast_ref::<DcError>().is_some());
    }

    #[tokio::test]
    async fn test_password_needs_matching_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let app = signed_in(dir.path(), false).await;
        let args = PasswordArgs {
            current: "clerk1234".into(),
            new: "longenough1".into(),
            confirm: "different1".into(),
        };
        assert!(change_password(&app, args).await.is_err());
    }
}
