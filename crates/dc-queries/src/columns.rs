//! Table columns
//!
//! Each listable entity declares its columns and how to read a comparable
//! value out of each one.

use std::cmp::Ordering;

use chrono::NaiveDate;
use dc_models::{Municipality, Professional, Project};

/// A cell value that can be compared against other cells of the same column
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Null,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl SortValue {
    pub fn text(value: impl Into<String>) -> Self {
        SortValue::Text(value.into())
    }

    /// `None` and blank strings read as `Null`
    pub fn opt_text(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => SortValue::Text(v.to_string()),
            _ => SortValue::Null,
        }
    }

    pub fn opt_date(value: Option<NaiveDate>) -> Self {
        value.map(SortValue::Date).unwrap_or(SortValue::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SortValue::Null)
    }

    /// Text shown for the cell, used by free-text filters
    pub fn display(&self) -> Option<String> {
        match self {
            SortValue::Null => None,
            SortValue::Text(s) => Some(s.clone()),
            SortValue::Number(n) => Some(n.to_string()),
            SortValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortValue::Null => 0,
            SortValue::Number(_) => 1,
            SortValue::Date(_) => 2,
            SortValue::Text(_) => 3,
        }
    }

    /// Total order; `Null` is the smallest value and equals itself.
    pub fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Null, SortValue::Null) => Ordering::Equal,
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

/// A column definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub caption: &'static str,
    /// Included in free-text search
    pub searchable: bool,
}

impl Column {
    pub const fn new(name: &'static str, caption: &'static str) -> Self {
        Self {
            name,
            caption,
            searchable: true,
        }
    }

    pub const fn hidden_from_search(mut self) -> Self {
        self.searchable = false;
        self
    }
}

/// An entity that can be shown in a table
pub trait Columns {
    fn columns() -> &'static [Column];

    /// Value of `column`, `None` when the column does not exist
    fn value(&self, column: &str) -> Option<SortValue>;

    fn column(name: &str) -> Option<&'static Column> {
        Self::columns().iter().find(|c| c.name == name)
    }

    fn has_column(name: &str) -> bool {
        Self::column(name).is_some()
    }
}

pub mod project {
    pub const NAME: &str = "name";
    pub const CASE_ID: &str = "case_id";
    pub const ADDRESS: &str = "address";
    pub const STATUS: &str = "status";
    pub const MUNICIPALITY: &str = "municipality";
    pub const DUE_DATE: &str = "due_date";
    pub const STATUS_DUE_DATE: &str = "status_due_date";
    pub const PROFESSIONALS: &str = "professionals";
    pub const CREATED_AT: &str = "created_at";
}

const PROJECT_COLUMNS: &[Column] = &[
    Column::new(project::NAME, "Name"),
    Column::new(project::CASE_ID, "Case"),
    Column::new(project::ADDRESS, "Address"),
    Column::new(project::STATUS, "Status"),
    Column::new(project::MUNICIPALITY, "Municipality"),
    Column::new(project::DUE_DATE, "Due").hidden_from_search(),
    Column::new(project::STATUS_DUE_DATE, "Status due").hidden_from_search(),
    Column::new(project::PROFESSIONALS, "Professionals").hidden_from_search(),
    Column::new(project::CREATED_AT, "Created").hidden_from_search(),
];

impl Columns for Project {
    fn columns() -> &'static [Column] {
        PROJECT_COLUMNS
    }

    fn value(&self, column: &str) -> Option<SortValue> {
        Some(match column {
            project::NAME => SortValue::text(&self.name),
            project::CASE_ID => SortValue::opt_text(self.case_id.as_deref()),
            project::ADDRESS => SortValue::opt_text(Some(self.address.as_str())),
            project::STATUS => SortValue::opt_text(self.status.as_ref().map(|s| s.label())),
            project::MUNICIPALITY => {
                SortValue::opt_text(self.municipality.as_ref().map(|m| m.name.as_str()))
            }
            project::DUE_DATE => SortValue::opt_date(self.due_date),
            project::STATUS_DUE_DATE => SortValue::opt_date(self.status_due_date),
            project::PROFESSIONALS => SortValue::Number(self.professionals.len() as f64),
            project::CREATED_AT => self
                .created_at
                .map(|ts| SortValue::Number(ts.timestamp_millis() as f64))
                .unwrap_or(SortValue::Null),
            _ => return None,
        })
    }
}

pub mod professional {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "professional_type";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const LICENSE_NUMBER: &str = "license_number";
    pub const LICENSE_EXPIRATION_DATE: &str = "license_expiration_date";
    pub const STATUS: &str = "status";
}

const PROFESSIONAL_COLUMNS: &[Column] = &[
    Column::new(professional::NAME, "Name"),
    Column::new(professional::TYPE, "Type"),
    Column::new(professional::EMAIL, "Email"),
    Column::new(professional::PHONE, "Phone"),
    Column::new(professional::LICENSE_NUMBER, "License"),
    Column::new(professional::LICENSE_EXPIRATION_DATE, "License expires").hidden_from_search(),
    Column::new(professional::STATUS, "Status"),
];

impl Columns for Professional {
    fn columns() -> &'static [Column] {
        PROFESSIONAL_COLUMNS
    }

    fn value(&self, column: &str) -> Option<SortValue> {
        Some(match column {
            professional::NAME => SortValue::text(&self.name),
            professional::TYPE => SortValue::opt_text(self.type_name()),
            professional::EMAIL => SortValue::opt_text(self.email.as_deref()),
            professional::PHONE => SortValue::opt_text(self.phone.as_deref()),
            professional::LICENSE_NUMBER => SortValue::opt_text(self.license_number.as_deref()),
            professional::LICENSE_EXPIRATION_DATE => {
                SortValue::opt_date(self.license_expiration_date)
            }
            professional::STATUS => {
                SortValue::opt_text(self.status.as_ref().map(|s| s.as_str()))
            }
            _ => return None,
        })
    }
}

pub mod municipality {
    pub const NAME: &str = "name";
    pub const CONTACT_PERSON: &str = "contact_person";
    pub const CONTACT_EMAIL: &str = "contact_email";
    pub const CONTACT_PHONE: &str = "contact_phone";
    pub const TEMPLATES: &str = "templates";
}

const MUNICIPALITY_COLUMNS: &[Column] = &[
    Column::new(municipality::NAME, "Name"),
    Column::new(municipality::CONTACT_PERSON, "Contact"),
    Column::new(municipality::CONTACT_EMAIL, "Email"),
    Column::new(municipality::CONTACT_PHONE, "Phone"),
    Column::new(municipality::TEMPLATES, "Templates").hidden_from_search(),
];

impl Columns for Municipality {
    fn columns() -> &'static [Column] {
        MUNICIPALITY_COLUMNS
    }

    fn value(&self, column: &str) -> Option<SortValue> {
        Some(match column {
            municipality::NAME => SortValue::text(&self.name),
            municipality::CONTACT_PERSON => SortValue::opt_text(self.contact_person.as_deref()),
            municipality::CONTACT_EMAIL => SortValue::opt_text(self.contact_email.as_deref()),
            municipality::CONTACT_PHONE => SortValue::opt_text(self.contact_phone.as_deref()),
            municipality::TEMPLATES => SortValue::Number(self.templates.len() as f64),
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_models::ProjectStatus;

    #[test]
    fn test_null_is_smallest() {
        assert_eq!(SortValue::Null.compare(&SortValue::Null), Ordering::Equal);
        assert_eq!(SortValue::Null.compare(&SortValue::text("a")), Ordering::Less);
        assert_eq!(
            SortValue::Number(2.0).compare(&SortValue::Number(10.0)),
            Ordering::Less
        );
    }

    #[test]
    fn test_project_values() {
        let tower = Project {
            name: "Tower".into(),
            status: Some(ProjectStatus::PostPermit),
            ..Default::default()
        };
        assert_eq!(tower.value(project::NAME), Some(SortValue::text("Tower")));
        assert_eq!(tower.value(project::STATUS), Some(SortValue::text("Post permit")));
        assert_eq!(tower.value(project::CASE_ID), Some(SortValue::Null));
        assert_eq!(tower.value("budget"), None);
        assert!(Project::has_column(project::DUE_DATE));
        assert!(!Project::column(project::DUE_DATE).unwrap().searchable);
    }

    #[test]
    fn test_blank_text_is_null() {
        let blank = Professional {
            email: Some("  ".into()),
            ..Default::default()
        };
        assert!(blank.value(professional::EMAIL).unwrap().is_null());
    }
}
