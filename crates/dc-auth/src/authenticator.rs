//! Login, logout and startup validation

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dc_core::{DcError, DcResult};
use dc_models::{LoginRequest, LoginResponse, PasswordChange, UserProfile};
use tracing::{debug, info, instrument, warn};

use crate::jwt;
use crate::permissions::{CurrentUser, HOME_PATH, LOGIN_PATH};
use crate::session::{Session, SessionStore};

/// The backend calls authentication needs
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> DcResult<LoginResponse>;

    /// Validates the stored token
    async fn profile(&self) -> DcResult<UserProfile>;

    async fn change_password(&self, change: &PasswordChange) -> DcResult<()>;
}

/// Where the user lands after an auth transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    Home,
    Login,
}

impl Redirect {
    pub fn path(self) -> &'static str {
        match self {
            Redirect::Home => HOME_PATH,
            Redirect::Login => LOGIN_PATH,
        }
    }
}

/// Result of startup validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Authenticated(CurrentUser),
    LoggedOut(Redirect),
}

impl AuthState {
    pub fn user(&self) -> Option<&CurrentUser> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            AuthState::LoggedOut(_) => None,
        }
    }
}

pub struct Authenticator {
    backend: Arc<dyn AuthBackend>,
    store: Arc<dyn SessionStore>,
    cookie_lifetime: Duration,
}

impl Authenticator {
    pub fn new(backend: Arc<dyn AuthBackend>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            backend,
            store,
            cookie_lifetime: Duration::days(7),
        }
    }

    pub fn with_cookie_lifetime_days(mut self, days: i64) -> Self {
        self.cookie_lifetime = Duration::days(days);
        self
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Sign in and persist the session cookies
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> DcResult<Redirect> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let response = self.backend.login(&request).await?;
        if response.access_token.is_empty() {
            return Err(DcError::Unauthorized {
                message: "Login response carried no access token".to_string(),
            });
        }

        let mut session = Session::from(response);
        if session.user_email.is_empty() {
            session.user_email = request.email;
        }
        self.store.save_session(&session, self.cookie_lifetime)?;
        info!(user = %session.user_email, roles = ?session.roles, "Signed in");
        Ok(Redirect::Home)
    }

    /// Clear the session. Never fails: a store error is logged and the
    /// user still lands on the login page.
    pub fn logout(&self) -> Redirect {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear session cookies");
        }
        debug!("Signed out");
        Redirect::Login
    }

    /// Startup check: a missing or rejected session logs out.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> AuthState {
        let session = match self.store.load_session() {
            Ok(Some(session)) => session,
            Ok(None) => return AuthState::LoggedOut(self.logout()),
            Err(e) => {
                warn!(error = %e, "Unreadable session");
                return AuthState::LoggedOut(self.logout());
            }
        };

        if let Err(e) = jwt::check_expiry(&session.access_token, Utc::now()) {
            info!(error = %e, "Stored token is no longer valid");
            return AuthState::LoggedOut(self.logout());
        }

        match self.backend.profile().await {
            Ok(profile) => {
                debug!(user = %profile.email, "Token validated");
                AuthState::Authenticated(CurrentUser::from(&session))
            }
            Err(e) => {
                info!(error = %e, "Token rejected by backend");
                AuthState::LoggedOut(self.logout())
            }
        }
    }

    /// The user as the stored cookies describe them, without a network call
    pub fn current_user(&self) -> Option<CurrentUser> {
        let session = self.store.load_session().ok().flatten()?;
        if jwt::check_expiry(&session.access_token, Utc::now()).is_err() {
            return None;
        }
        Some(CurrentUser::from(&session))
    }

    /// The user or `Unauthorized`
    pub fn require_user(&self) -> DcResult<CurrentUser> {
        self.current_user().ok_or_else(|| DcError::Unauthorized {
            message: "Please log in first".to_string(),
        })
    }

    pub fn backend(&self) -> &Arc<dyn AuthBackend> {
        &self.backend
    }
}
