//! Password changes and admin user management

use std::sync::Arc;

use dc_auth::AuthBackend;
use dc_client::UsersApi;
use dc_contracts::accounts::{NewUserContract, PasswordChangeContract};
use dc_core::{DcError, DcResult, EntityId};
use dc_models::{ManagedUser, NewUser, PasswordChange};
use tracing::{info, instrument, warn};

use crate::base::ServiceContext;
use crate::list::EntityList;

pub const WRONG_PASSWORD: &str = "Current password is incorrect";
pub const PASSWORD_FAILED: &str = "An error occurred while changing password";

pub struct AccountService {
    auth: Arc<dyn AuthBackend>,
    users: Arc<dyn UsersApi>,
    ctx: ServiceContext,
}

impl AccountService {
    pub fn new(auth: Arc<dyn AuthBackend>, users: Arc<dyn UsersApi>, ctx: ServiceContext) -> Self {
        Self { auth, users, ctx }
    }

    /// Change the signed-in user's password. A rejected current password
    /// gets its own message instead of the backend's.
    #[instrument(skip_all)]
    pub async fn change_password(&self, change: &PasswordChange) -> DcResult<()> {
        self.ctx.validate(&PasswordChangeContract::new(), change)?;

        match self.auth.change_password(change).await {
            Ok(()) => {
                self.ctx.success("Password changed successfully");
                Ok(())
            }
            Err(err) if err.is_unauthorized() => {
                warn!(error = %err, "Password change rejected");
                self.ctx.error(WRONG_PASSWORD);
                Err(DcError::Unauthorized {
                    message: WRONG_PASSWORD.to_string(),
                })
            }
            Err(err) => Err(self.ctx.fail(err, PASSWORD_FAILED)),
        }
    }

    #[instrument(skip(self))]
    pub async fn users(&self) -> DcResult<EntityList<ManagedUser>> {
        let users = self
            .ctx
            .report(self.users.list_users().await, "Failed to fetch users")?;
        Ok(EntityList::new(users))
    }

    #[instrument(skip(self, list, user), fields(email = %user.email))]
    pub async fn create_user(
        &self,
        list: &mut EntityList<ManagedUser>,
        user: &NewUser,
    ) -> DcResult<ManagedUser> {
        self.ctx.validate(&NewUserContract::new(), user)?;
        let created = self
            .ctx
            .report(self.users.create_user(user).await, "Failed to create user")?;
        info!(id = ?created.id, roles = ?created.roles, "User created");
        self.ctx.success("User created successfully");
        list.upsert(created.clone());
        Ok(created)
    }

    #[instrument(skip(self, list))]
    pub async fn delete_user(
        &self,
        list: &mut EntityList<ManagedUser>,
        id: &EntityId,
    ) -> DcResult<()> {
        self.ctx
            .report(self.users.delete_user(id).await, "Failed to delete user")?;
        list.remove(id);
        self.ctx.success("User deleted successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::CollectingNotifier;
    use dc_auth::{Authenticator, MemorySessionStore, SessionStore};
    use dc_client::MemoryApi;
    use dc_contracts::accounts::{PASSWORD_MISMATCH, PASSWORD_TOO_SHORT};

    async fn signed_in() -> (AccountService, Arc<MemoryApi>, Arc<CollectingNotifier>) {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let api = Arc::new(MemoryApi::seeded().with_session(store.clone()));
        Authenticator::new(api.clone(), store)
            .login("admin@docconstruct.local", "admin1234")
            .await
            .unwrap();

        let notifier = CollectingNotifier::shared();
        let service = AccountService::new(api.clone(), api.clone(), ServiceContext::new(notifier.clone()));
        (service, api, notifier)
    }

    fn change(current: &str, new: &str, confirm: &str) -> PasswordChange {
        PasswordChange {
            current_password: current.into(),
            new_password: new.into(),
            confirm_password: confirm.into(),
        }
    }

    #[tokio::test]
    async fn test_password_rules_run_first() {
        let (service, api, notifier) = signed_in().await;

        assert!(service.change_password(&change("admin1234", "short", "short")).await.is_err());
        assert_eq!(notifier.last().unwrap().message, PASSWORD_TOO_SHORT);

        assert!(service
            .change_password(&change("admin1234", "longenough1", "longenough2"))
            .await
            .is_err());
        assert_eq!(notifier.last().unwrap().message, PASSWORD_MISMATCH);
        assert_eq!(api.call_count("change_password"), 0);
    }

    #[tokio::test]
    async fn test_wrong_current_password() {
        let (service, _api, notifier) = signed_in().await;
        let err = service
            .change_password(&change("guess", "longenough1", "longenough1"))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(notifier.last().unwrap().message, WRONG_PASSWORD);
    }

    #[tokio::test]
    async fn test_change_password() {
        let (service, api, notifier) = signed_in().await;
        service
            .change_password(&change("admin1234", "longenough1", "longenough1"))
            .await
            .unwrap();
        assert_eq!(notifier.last().unwrap().message, "Password changed successfully");

        api.fail_on("change_password", 500, "");
        assert!(service
            .change_password(&change("longenough1", "longenough2", "longenough2"))
            .await
            .is_err());
        assert_eq!(
            notifier.last().unwrap().message,
            format!("{PASSWORD_FAILED} [Status: 500]")
        );
    }

    #[tokio::test]
    async fn test_user_management() {
        let (service, api, notifier) = signed_in().await;
        let mut users = service.users().await.unwrap();
        assert_eq!(users.len(), 2);

        let created = service
            .create_user(
                &mut users,
                &NewUser {
                    email: "inspector@docconstruct.local".into(),
                    password: "inspect123".into(),
                    roles: vec!["admin".into()],
                },
            )
            .await
            .unwrap();
        assert_eq!(users.len(), 3);

        let duplicate = NewUser {
            email: "inspector@docconstruct.local".into(),
            password: "again".into(),
            roles: Vec::new(),
        };
        assert!(service.create_user(&mut users, &duplicate).await.is_err());
        assert_eq!(
            notifier.last().unwrap().message,
            "User already exists [Status: 409]"
        );

        service
            .delete_user(&mut users, created.id.as_ref().unwrap())
            .await
            .unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(api.call_count("delete_user"), 1);
    }
}
