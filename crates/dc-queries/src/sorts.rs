//! Sort orders
//!
//! Sorting is stable: rows that compare equal keep the order the backend
//! returned them in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::columns::Columns;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// A-Z, 1-9, oldest first; empty values first
    #[default]
    Asc,
    /// Z-A, 9-1, newest first; empty values last
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn reverse(&self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The sort a table is currently showing. No field means backend order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState<F = String> {
    pub field: Option<F>,
    pub direction: SortDirection,
}

impl<F> Default for SortState<F> {
    fn default() -> Self {
        Self {
            field: None,
            direction: SortDirection::Asc,
        }
    }
}

impl<F> SortState<F> {
    pub fn new(field: F, direction: SortDirection) -> Self {
        Self {
            field: Some(field),
            direction,
        }
    }

    pub fn asc(field: impl Into<F>) -> Self {
        Self::new(field.into(), SortDirection::Asc)
    }

    pub fn desc(field: impl Into<F>) -> Self {
        Self::new(field.into(), SortDirection::Desc)
    }

    pub fn is_unsorted(&self) -> bool {
        self.field.is_none()
    }
}

impl<F: PartialEq> SortState<F> {
    /// Header click: the same field flips direction, a new field starts
    /// ascending.
    pub fn toggle(&mut self, field: F) {
        if self.field.as_ref() == Some(&field) {
            self.direction = self.direction.reverse();
        } else {
            self.field = Some(field);
            self.direction = SortDirection::Asc;
        }
    }
}

impl SortState<String> {
    /// `name`, `name:desc` or `-name`
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(field) = raw.strip_prefix('-') {
            return Some(Self::desc(field.trim()));
        }
        match raw.split_once(':') {
            Some((field, direction)) => {
                Some(Self::new(field.trim().to_string(), SortDirection::parse(direction)?))
            }
            None => Some(Self::asc(raw)),
        }
    }
}

/// Sort `items` in place.
///
/// A field the entity does not have leaves the order unchanged.
pub fn sort_items<T, F>(items: &mut [T], state: &SortState<F>)
where
    T: Columns,
    F: AsRef<str>,
{
    let Some(field) = state.field.as_ref().map(AsRef::as_ref) else {
        return;
    };
    if !T::has_column(field) {
        return;
    }
    items.sort_by(|a, b| {
        let (Some(left), Some(right)) = (a.value(field), b.value(field)) else {
            return std::cmp::Ordering::Equal;
        };
        match state.direction {
            SortDirection::Asc => left.compare(&right),
            SortDirection::Desc => right.compare(&left),
        }
    });
}

/// A sorted copy of `items`
pub fn sorted<T, F>(items: &[T], state: &SortState<F>) -> Vec<T>
where
    T: Columns + Clone,
    F: AsRef<str>,
{
    let mut out = items.to_vec();
    sort_items(&mut out, state);
    out
}

/// Projects list newest first
pub fn default_project_sort() -> SortState {
    SortState::desc(crate::columns::project::CREATED_AT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dc_models::Project;

    fn project(name: &str, due: Option<(i32, u32, u32)>) -> Project {
        Project {
            name: name.into(),
            due_date: due.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            ..Default::default()
        }
    }

    fn names(items: &[Project]) -> Vec<&str> {
        items.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_sort_direction() {
        assert_eq!(SortDirection::parse("asc"), Some(SortDirection::Asc));
        assert_eq!(SortDirection::parse("DESC"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::parse("up"), None);
        assert_eq!(SortDirection::Asc.reverse(), SortDirection::Desc);
    }

    #[test]
    fn test_nulls_first_ascending_last_descending() {
        let mut items = vec![
            project("b", Some((2025, 3, 1))),
            project("none-1", None),
            project("a", Some((2024, 1, 1))),
            project("none-2", None),
        ];

        sort_items(&mut items, &SortState::<String>::asc("due_date"));
        assert_eq!(names(&items), vec!["none-1", "none-2", "a", "b"]);

        sort_items(&mut items, &SortState::<String>::desc("due_date"));
        assert_eq!(names(&items), vec!["b", "a", "none-1", "none-2"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut items = vec![project("x", None), project("y", None), project("z", None)];
        sort_items(&mut items, &SortState::<String>::desc("due_date"));
        assert_eq!(names(&items), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_unknown_field_keeps_order() {
        let mut items = vec![project("b", None), project("a", None)];
        sort_items(&mut items, &SortState::<String>::asc("budget"));
        assert_eq!(names(&items), vec!["b", "a"]);

        sort_items(&mut items, &SortState::<String>::default());
        assert_eq!(names(&items), vec!["b", "a"]);
    }

    #[test]
    fn test_toggle() {
        let mut state = SortState::<String>::default();
        state.toggle("name".into());
        assert_eq!(state, SortState::asc("name"));
        state.toggle("name".into());
        assert_eq!(state.direction, SortDirection::Desc);
        state.toggle("due_date".into());
        assert_eq!(state, SortState::asc("due_date"));
    }

    #[test]
    fn test_parse() {
        assert_eq!(SortState::<String>::parse("name"), Some(SortState::asc("name")));
        assert_eq!(SortState::<String>::parse("name:desc"), Some(SortState::desc("name")));
        assert_eq!(SortState::<String>::parse("-due_date"), Some(SortState::desc("due_date")));
        assert_eq!(SortState::<String>::parse("name:sideways"), None);
        assert_eq!(SortState::<String>::parse(""), None);
    }
}
