//! List filters

use dc_core::normalize_token;

use crate::columns::Columns;

/// Free-text search over every searchable column, case-insensitive.
/// A blank query matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    query: String,
}

impl Filter {
    pub fn new(query: impl AsRef<str>) -> Self {
        Self {
            query: query.as_ref().trim().to_lowercase(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_blank(&self) -> bool {
        self.query.is_empty()
    }

    pub fn matches<T: Columns>(&self, item: &T) -> bool {
        if self.is_blank() {
            return true;
        }
        T::columns()
            .iter()
            .filter(|c| c.searchable)
            .filter_map(|c| item.value(c.name))
            .filter_map(|v| v.display())
            .any(|text| text.to_lowercase().contains(&self.query))
    }

    pub fn apply<T: Columns + Clone>(&self, items: &[T]) -> Vec<T> {
        items.iter().filter(|i| self.matches(*i)).cloned().collect()
    }
}

/// Exact match on one column, e.g. a status or professional type.
///
/// Values compare after token normalization, so `PRE_PERMIT` selects a
/// project shown as "Pre permit".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub column: String,
    pub value: String,
}

impl FieldFilter {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// `column=value`
    pub fn parse(raw: &str) -> Option<Self> {
        let (column, value) = raw.split_once('=')?;
        let column = column.trim();
        (!column.is_empty()).then(|| Self::new(column, value.trim()))
    }

    /// An unknown column matches nothing.
    pub fn matches<T: Columns>(&self, item: &T) -> bool {
        let expected = normalize_token(&self.value);
        match item.value(&self.column) {
            Some(value) => match value.display() {
                Some(text) => normalize_token(&text) == expected,
                None => expected.is_empty(),
            },
            None => false,
        }
    }

    pub fn apply<T: Columns + Clone>(&self, items: &[T]) -> Vec<T> {
        items.iter().filter(|i| self.matches(*i)).cloned().collect()
    }
}
