//! Rendering results as tables, JSON or YAML

use std::fmt::Display;

use clap::ValueEnum;
use dc_auth::NavItem;
use dc_core::Page;
use dc_models::{
    DocumentTemplate, GeneratedDocument, ManagedUser, Municipality, Professional,
    ProfessionalType, Project, ProjectProfessional, SegmentHit, SurveyQuestionHit,
};
use dc_services::{FileEntry, Notice, NoticeLevel, Notifier};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

/// Types that render as table rows
pub trait Tabular {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

fn opt<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

impl Tabular for Project {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "CASE", "ADDRESS", "STATUS", "DUE", "PROFESSIONALS"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            opt(self.id.as_ref()),
            self.name.clone(),
            opt(self.case_id.as_deref()),
            self.address.clone(),
            opt(self.status.as_ref().map(|s| s.label())),
            opt(self.due_date),
            self.professionals.len().to_string(),
        ]
    }
}

impl Tabular for ProjectProfessional {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "ROLE"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            opt(self.professional_id()),
            self.display_name().to_string(),
            opt(self.role.as_deref()),
        ]
    }
}

impl Tabular for Professional {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "TYPE", "LICENSE", "EXPIRES", "STATUS", "EMAIL"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            opt(self.id.as_ref()),
            self.name.clone(),
            opt(self.type_name()),
            opt(self.license_number.as_deref()),
            opt(self.license_expiration_date),
            opt(self.status.as_ref()),
            opt(self.email.as_deref()),
        ]
    }
}

impl Tabular for ProfessionalType {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME"]
    }

    fn row(&self) -> Vec<String> {
        vec![opt(self.id.as_ref()), self.name.clone()]
    }
}

impl Tabular for Municipality {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "CONTACT", "EMAIL", "PHONE", "TEMPLATES"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            opt(self.id.as_ref()),
            self.name.clone(),
            opt(self.contact_person.as_deref()),
            opt(self.contact_email.as_deref()),
            opt(self.contact_phone.as_deref()),
            self.templates.len().to_string(),
        ]
    }
}

impl Tabular for DocumentTemplate {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "MUNICIPALITY", "PROFESSIONAL TYPE", "FILE"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            opt(self.id.as_ref()),
            self.name.clone(),
            opt(self.municipality_id.as_ref()),
            opt(self
                .professional_type
                .as_ref()
                .map(|t| t.name.as_str())
                .or(self.professional_type_id.as_ref().map(|id| id.as_str()))),
            opt(self.file.as_ref().map(|f| f.file_name.as_str())),
        ]
    }
}

impl Tabular for GeneratedDocument {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "DOCUMENT", "TEMPLATE", "STATUS"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            opt(self.id.as_ref()),
            self.label(),
            opt(self.template_id.as_ref()),
            opt(self.status.as_ref()),
        ]
    }
}

impl Tabular for FileEntry {
    fn headers() -> Vec<&'static str> {
        vec!["TYPE", "STATE", "DOCUMENT", "FILE", "PREVIEW"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.document_type.clone(),
            if self.is_uploaded() { "uploaded" } else { "missing" }.to_string(),
            opt(self.document_id()),
            opt(self.file_name()),
            if self.can_preview() { "pdf" } else { "-" }.to_string(),
        ]
    }
}

impl Tabular for ManagedUser {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "EMAIL", "ROLES", "CREATED"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            opt(self.id.as_ref()),
            self.email.clone(),
            if self.roles.is_empty() { "-".to_string() } else { self.roles.join(",") },
            opt(self.created_at.map(|t| t.format("%Y-%m-%d"))),
        ]
    }
}

impl Tabular for SurveyQuestionHit {
    fn headers() -> Vec<&'static str> {
        vec!["SCORE", "QUESTION", "SURVEY", "DATE", "SEGMENTS", "PANEL"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            format!("{:.0}%", self.survey_score * 100.0),
            self.question.clone(),
            self.survey_name.clone(),
            opt(self.survey_date()),
            self.segments.join(", "),
            if self.panel.is_empty() { "-".to_string() } else { self.panel.clone() },
        ]
    }
}

impl Tabular for SegmentHit {
    fn headers() -> Vec<&'static str> {
        vec!["SEGMENT", "SURVEYS"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.segment_name.clone(), self.survey_count.to_string()]
    }
}

impl Tabular for NavItem {
    fn headers() -> Vec<&'static str> {
        vec!["LABEL", "PATH"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.label.to_string(), self.path.to_string()]
    }
}

/// Left-aligned columns sized to their widest cell
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let pad = width.saturating_sub(cell.chars().count());
                format!("{cell}{}", " ".repeat(pad))
            })
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let mut out = vec![line(headers.to_vec())];
    out.extend(rows.iter().map(|row| line(row.iter().map(String::as_str).collect())));
    out.join("\n")
}

/// Key/value pairs for single records
pub fn render_fields(fields: &[(&str, String)]) -> String {
    let width = fields.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    fields
        .iter()
        .map(|(key, value)| format!("{key:<width$}  {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy)]
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Serialize `value` for the structured formats
    fn structured<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<Option<String>> {
        Ok(match self.format {
            OutputFormat::Table => None,
            OutputFormat::Json => Some(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Some(serde_yaml::to_string(value)?),
        })
    }

    pub fn list<T: Serialize + Tabular>(&self, items: &[T]) -> anyhow::Result<()> {
        match self.structured(items)? {
            Some(text) => println!("{text}"),
            None if items.is_empty() => println!("(none)"),
            None => {
                let rows: Vec<Vec<String>> = items.iter().map(Tabular::row).collect();
                println!("{}", render_table(&T::headers(), &rows));
            }
        }
        Ok(())
    }

    pub fn page<T: Serialize + Tabular>(&self, page: &Page<T>) -> anyhow::Result<()> {
        if let Some(text) = self.structured(page)? {
            println!("{text}");
            return Ok(());
        }
        self.list(&page.items)?;
        println!(
            "\npage {}/{} ({} total)",
            page.page, page.total_pages, page.total
        );
        Ok(())
    }

    /// `render` draws the table form
    pub fn record<T, F>(&self, value: &T, render: F) -> anyhow::Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce() -> String,
    {
        match self.structured(value)? {
            Some(text) => println!("{text}"),
            None => println!("{}", render()),
        }
        Ok(())
    }

    pub fn lines(&self, values: &[String]) -> anyhow::Result<()> {
        self.record(values, || values.join("\n"))
    }
}

/// Prints notices to stderr so stdout stays parseable
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => {
                tracing::debug!(notice = %notice.message, "Error notice");
                eprintln!("error: {}", notice.message);
            }
            NoticeLevel::Success | NoticeLevel::Info => eprintln!("{}", notice.message),
        }
    }
}
