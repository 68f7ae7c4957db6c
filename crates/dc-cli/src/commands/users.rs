use clap::Subcommand;
use dc_auth::permissions::ADMIN_ROLE;
use dc_core::EntityId;
use dc_models::NewUser;

use super::confirm_delete;
use crate::app::App;

const USER_MESSAGE: &str = "Are you sure you want to delete this user?";

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    List,
    Create {
        #[arg(long)]
        email: String,
        #[arg(long, env = "DOCCONSTRUCT_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
        /// Grant the admin role
        #[arg(long)]
        admin: bool,
    },
    Delete { id: EntityId },
}

pub async fn run(app: &App, command: UsersCommand) -> anyhow::Result<()> {
    app.require_admin()?;
    let accounts = app.accounts();
    let mut users = accounts.users().await?;

    match command {
        UsersCommand::List => app.output.list(users.items()),
        UsersCommand::Create {
            email,
            password,
            admin,
        } => {
            let user = NewUser {
                email,
                password,
                roles: if admin { vec![ADMIN_ROLE.to_string()] } else { Vec::new() },
            };
            accounts.create_user(&mut users, &user).await?;
            app.output.list(users.items())
        }
        UsersCommand::Delete { id } => {
            confirm_delete(app, id, USER_MESSAGE, |id| async move {
                accounts.delete_user(&mut users, &id).await
            })
            .await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::signed_in;
    use dc_core::DcError;

    #[tokio::test]
    async fn test_clerk_cannot_manage_users() {
        let dir = tempfile::tempdir().unwrap();
        let app = signed_in(dir.path(), false).await;
        let err = run(&app, UsersCommand::List).await.unwrap_err();
        assert_eq!(err.downcast_ref::<DcError>().unwrap().status_code(), 403);
    }

    #[tokio::test]
    async fn test_admin_creates_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let app = signed_in(dir.path(), true).await;
        run(
            &app,
            UsersCommand::Create {
                email: "planner@docconstruct.local".into(),
                password: "planner123".into(),
                admin: false,
            },
        )
        .await
        .unwrap();

        let users = app.accounts().users().await.unwrap();
        let created = users
            .iter()
            .find(|u| u.email == "planner@docconstruct.local")
            .and_then(|u| u.id.clone())
            .unwrap();
        run(&app, UsersCommand::Delete { id: created }).await.unwrap();
        assert_eq!(app.accounts().users().await.unwrap().len(), 2);
    }
}
