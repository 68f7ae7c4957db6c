//! Backend routes, relative to the configured base URL

pub const LOGIN: &str = "auth/login";
pub const PROFILE: &str = "auth/profile";
pub const CHANGE_PASSWORD: &str = "auth/change-password";

pub const PROJECTS: &str = "projects";
pub const PROJECT: &str = "project";
pub const PROJECT_STATUSES: &str = "project/statuses";
pub const PROJECT_PROFESSIONALS: &str = "project/professionals";
pub const PROJECT_DOCUMENT: &str = "project/document";
pub const PROJECT_DOCUMENT_TYPES: &str = "project/document/types";

pub const PROFESSIONALS: &str = "professionals";
pub const PROFESSIONAL: &str = "professional";
pub const PROFESSIONAL_TYPES: &str = "professional/types";
pub const PROFESSIONAL_STATUSES: &str = "professional/statuses";
pub const PROFESSIONAL_DOCUMENT: &str = "professional/document";
pub const PROFESSIONAL_DOCUMENT_TYPES: &str = "professional/document/types";
pub const PROFESSIONAL_IMPORT: &str = "professional/import";

pub const MUNICIPALITIES: &str = "municipalities";
pub const TEMPLATES: &str = "documents/templates";
pub const GENERATE_DOCUMENT: &str = "documents/generate";
pub const UPLOAD_DOCUMENT: &str = "documents/upload";

pub const USERS: &str = "users";

pub const SEARCH_QUESTIONS: &str = "search/questions";
pub const SEARCH_SEGMENTS: &str = "search/segments";

/// `municipalities/:id`
pub fn municipality(id: &str) -> String {
    format!("{MUNICIPALITIES}/{id}")
}

/// `documents/templates/:id`
pub fn template(id: &str) -> String {
    format!("{TEMPLATES}/{id}")
}

/// `users/:id`
pub fn user(id: &str) -> String {
    format!("{USERS}/{id}")
}
