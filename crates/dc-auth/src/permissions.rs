//! Role gating for navigation and routes

use serde::{Deserialize, Serialize};

use crate::session::Session;

pub const ADMIN_ROLE: &str = "admin";

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/surveys";
pub const SETTINGS_PATH: &str = "/settings";
pub const PROFILE_PATH: &str = "/profile";

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub email: String,
    pub roles: Vec<String>,
}

impl CurrentUser {
    pub fn new(email: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            email: email.into(),
            roles,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    /// Only admins may filter or drill into embedded reports
    pub fn can_interact_with_reports(&self) -> bool {
        self.is_admin()
    }
}

impl From<&Session> for CurrentUser {
    fn from(session: &Session) -> Self {
        Self {
            email: session.user_email.clone(),
            roles: session.roles.clone(),
        }
    }
}

/// A sidebar entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
}

const NAV_ITEMS: [NavItem; 6] = [
    NavItem { label: "Projects", path: "/projects" },
    NavItem { label: "Professionals", path: "/professionals" },
    NavItem { label: "Municipalities", path: "/municipalities" },
    NavItem { label: "Surveys", path: HOME_PATH },
    NavItem { label: "Surveys timeline", path: "/surveys-timeline" },
    NavItem { label: "Search", path: "/search-questions" },
];

const SETTINGS_ITEM: NavItem = NavItem { label: "Settings", path: SETTINGS_PATH };
const PROFILE_ITEM: NavItem = NavItem { label: "Profile", path: PROFILE_PATH };

/// Sidebar entries for `user`, profile last
pub fn navigation(user: &CurrentUser) -> Vec<NavItem> {
    let mut items = NAV_ITEMS.to_vec();
    if user.is_admin() {
        items.push(SETTINGS_ITEM);
    }
    items.push(PROFILE_ITEM);
    items
}

/// The sidebar shows everywhere except the login page
pub fn show_sidebar(path: &str) -> bool {
    normalize_path(path) != LOGIN_PATH
}

/// Outcome of the route guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
}

/// Decide whether `user` may open `path`
pub fn guard(path: &str, user: Option<&CurrentUser>) -> RouteDecision {
    let path = normalize_path(path);
    match user {
        None if path == LOGIN_PATH => RouteDecision::Allow,
        None => RouteDecision::Redirect(LOGIN_PATH),
        Some(user) if is_under(path, SETTINGS_PATH) && !user.is_admin() => {
            RouteDecision::Redirect(HOME_PATH)
        }
        Some(_) => RouteDecision::Allow,
    }
}

fn normalize_path(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

fn is_under(path: &str, prefix: &str) -> bool {
    path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}
