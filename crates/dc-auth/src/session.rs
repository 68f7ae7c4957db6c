//! Cookie-backed session storage
//!
//! The session is three cookies: `userEmail`, `accessToken` and
//! `userRoles` (a JSON array). Each carries its own expiry; an expired
//! cookie reads as absent.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use dc_core::DcError;
use dc_models::LoginResponse;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const USER_EMAIL_COOKIE: &str = "userEmail";
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const USER_ROLES_COOKIE: &str = "userRoles";

/// Every cookie the session writes
pub const SESSION_COOKIES: [&str; 3] = [USER_EMAIL_COOKIE, ACCESS_TOKEN_COOKIE, USER_ROLES_COOKIE];

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session storage failed: {0}")]
    Io(#[from] io::Error),
    #[error("Session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("User not authenticated")]
    NotAuthenticated,
}

impl From<SessionError> for DcError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotAuthenticated => DcError::Unauthorized {
                message: "User not authenticated".to_string(),
            },
            SessionError::Io(e) => DcError::Io(e),
            SessionError::Corrupt(e) => DcError::Decode(e.to_string()),
        }
    }
}

/// One named cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Cookie {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Named cookies with expiry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookieJar {
    cookies: BTreeMap<String, Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cookie that expires `lifetime` from now
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>, lifetime: Duration) {
        self.cookies.insert(
            name.into(),
            Cookie {
                value: value.into(),
                expires_at: Some(Utc::now() + lifetime),
            },
        );
    }

    /// A live cookie's value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_at(name, Utc::now())
    }

    pub fn get_at(&self, name: &str, now: DateTime<Utc>) -> Option<&str> {
        self.cookies
            .get(name)
            .filter(|c| !c.is_expired(now))
            .map(|c| c.value.as_str())
            .filter(|v| !v.is_empty())
    }

    pub fn remove(&mut self, name: &str) -> Option<Cookie> {
        self.cookies.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Drop expired cookies, returning how many went
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.cookies.len();
        self.cookies.retain(|_, c| !c.is_expired(now));
        before - self.cookies.len()
    }
}

/// The signed-in user as the cookies describe them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_email: String,
    pub access_token: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Session {
    pub fn new(user_email: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_email: user_email.into(),
            access_token: access_token.into(),
            roles: Vec::new(),
        }
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    /// Read the session; `None` when either the email or the token is
    /// missing. Unreadable roles read as none.
    pub fn from_jar(jar: &CookieJar) -> Option<Self> {
        let user_email = jar.get(USER_EMAIL_COOKIE)?;
        let access_token = jar.get(ACCESS_TOKEN_COOKIE)?;
        let roles = jar
            .get(USER_ROLES_COOKIE)
            .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
            .unwrap_or_default();
        Some(Self {
            user_email: user_email.to_string(),
            access_token: access_token.to_string(),
            roles,
        })
    }

    pub fn write_to(&self, jar: &mut CookieJar, lifetime: Duration) -> Result<(), SessionError> {
        jar.set(USER_EMAIL_COOKIE, &self.user_email, lifetime);
        jar.set(ACCESS_TOKEN_COOKIE, &self.access_token, lifetime);
        jar.set(USER_ROLES_COOKIE, serde_json::to_string(&self.roles)?, lifetime);
        Ok(())
    }
}

impl From<LoginResponse> for Session {
    fn from(response: LoginResponse) -> Self {
        Self {
            user_email: response.email,
            access_token: response.access_token,
            roles: response.roles,
        }
    }
}

/// Storage for the cookie jar
pub trait SessionStore: Send + Sync {
    fn load_jar(&self) -> Result<CookieJar, SessionError>;

    fn save_jar(&self, jar: &CookieJar) -> Result<(), SessionError>;

    /// Remove every session cookie
    fn clear(&self) -> Result<(), SessionError>;

    fn load_session(&self) -> Result<Option<Session>, SessionError> {
        Ok(Session::from_jar(&self.load_jar()?))
    }

    fn save_session(&self, session: &Session, lifetime: Duration) -> Result<(), SessionError> {
        let mut jar = self.load_jar().unwrap_or_default();
        session.write_to(&mut jar, lifetime)?;
        self.save_jar(&jar)
    }

    /// Bearer token for outgoing requests
    fn access_token(&self) -> Option<String> {
        self.load_jar()
            .ok()
            .and_then(|jar| jar.get(ACCESS_TOKEN_COOKIE).map(str::to_string))
    }
}

/// Jar persisted as JSON, by default under `~/.docconstruct/`
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load_jar(&self) -> Result<CookieJar, SessionError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(CookieJar::new()),
            Ok(raw) => {
                let mut jar: CookieJar = serde_json::from_str(&raw)?;
                jar.purge_expired(Utc::now());
                Ok(jar)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(CookieJar::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save_jar(&self, jar: &CookieJar) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(jar)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut jar = match self.load_jar() {
            Ok(jar) => jar,
            // An unreadable file holds nothing worth keeping.
            Err(SessionError::Corrupt(_)) => CookieJar::new(),
            Err(e) => return Err(e),
        };
        for name in SESSION_COOKIES {
            jar.remove(name);
        }
        if jar.is_empty() {
            match fs::remove_file(&self.path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
                _ => return Ok(()),
            }
        }
        self.save_jar(&jar)
    }
}

/// In-memory store (for tests and offline runs)
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    jar: RwLock<CookieJar>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already holding `session`
    pub fn with_session(session: &Session, lifetime: Duration) -> Self {
        let mut jar = CookieJar::new();
        // Serializing a Vec<String> cannot fail.
        let _ = session.write_to(&mut jar, lifetime);
        Self {
            jar: RwLock::new(jar),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load_jar(&self) -> Result<CookieJar, SessionError> {
        Ok(self.jar.read().clone())
    }

    fn save_jar(&self, jar: &CookieJar) -> Result<(), SessionError> {
        *self.jar.write() = jar.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut jar = self.jar.write();
        for name in SESSION_COOKIES {
            jar.remove(name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new("dana@build.co.il", "tok-1").with_roles(vec!["admin".into()])
    }

    #[test]
    fn test_session_round_trip_through_jar() {
        let mut jar = CookieJar::new();
        session().write_to(&mut jar, Duration::days(7)).unwrap();
        assert_eq!(jar.get(USER_ROLES_COOKIE), Some(r#"["admin"]"#));
        assert_eq!(Session::from_jar(&jar), Some(session()));
    }

    #[test]
    fn test_missing_token_means_no_session() {
        let mut jar = CookieJar::new();
        jar.set(USER_EMAIL_COOKIE, "dana@build.co.il", Duration::days(7));
        assert!(Session::from_jar(&jar).is_none());
    }

    #[test]
    fn test_expired_cookie_reads_as_absent() {
        let mut jar = CookieJar::new();
        session().write_to(&mut jar, Duration::days(7)).unwrap();
        let later = Utc::now() + Duration::days(8);
        assert!(jar.get_at(ACCESS_TOKEN_COOKIE, later).is_none());
        assert_eq!(jar.purge_expired(later), 3);
        assert!(jar.is_empty());
    }

    #[test]
    fn test_corrupt_roles_read_as_empty() {
        let mut jar = CookieJar::new();
        session().write_to(&mut jar, Duration::days(7)).unwrap();
        jar.set(USER_ROLES_COOKIE, "admin", Duration::days(7));
        assert!(Session::from_jar(&jar).unwrap().roles.is_empty());
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert!(store.load_session().unwrap().is_none());

        store.save_session(&session(), Duration::days(7)).unwrap();
        assert_eq!(store.access_token().as_deref(), Some("tok-1"));

        store.clear().unwrap();
        assert!(store.load_session().unwrap().is_none());
        assert!(store.load_jar().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_persists_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let store = FileSessionStore::new(&path);

        assert!(store.load_session().unwrap().is_none());
        store.save_session(&session(), Duration::days(7)).unwrap();
        assert!(path.exists());

        let reopened = FileSessionStore::new(&path);
        assert_eq!(reopened.load_session().unwrap(), Some(session()));

        reopened.clear().unwrap();
        assert!(!path.exists());
        assert!(reopened.load_session().unwrap().is_none());
    }

    #[test]
    fn test_file_store_clear_keeps_other_cookies() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        let mut jar = CookieJar::new();
        session().write_to(&mut jar, Duration::days(7)).unwrap();
        jar.set("sidebarCollapsed", "true", Duration::days(30));
        store.save_jar(&jar).unwrap();

        store.clear().unwrap();
        let jar = store.load_jar().unwrap();
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.get("sidebarCollapsed"), Some("true"));
    }

    #[test]
    fn test_file_store_clear_survives_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let store = FileSessionStore::new(&path);
        assert!(matches!(store.load_jar(), Err(SessionError::Corrupt(_))));
        store.clear().unwrap();
        assert!(!path.exists());
    }
}
