//! One-pass list query: filter, then sort, then page

use dc_core::{paginate, Page, PageRequest};

use crate::columns::Columns;
use crate::filters::{FieldFilter, Filter};
use crate::sorts::{sort_items, SortState};

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filter: Filter,
    pub field_filters: Vec<FieldFilter>,
    pub sort: SortState,
    pub page: Option<PageRequest>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, query: impl AsRef<str>) -> Self {
        self.filter = Filter::new(query);
        self
    }

    pub fn only(mut self, filter: FieldFilter) -> Self {
        self.field_filters.push(filter);
        self
    }

    pub fn sort(mut self, sort: SortState) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    /// Without a page request everything lands on one page.
    pub fn apply<T: Columns + Clone>(&self, items: &[T]) -> Page<T> {
        let mut rows: Vec<T> = items
            .iter()
            .filter(|item| self.filter.matches(*item))
            .filter(|item| self.field_filters.iter().all(|f| f.matches(*item)))
            .cloned()
            .collect();
        sort_items(&mut rows, &self.sort);

        let request = self.page.unwrap_or(PageRequest {
            page: 1,
            per_page: rows.len().max(1),
        });
        paginate(&rows, request)
    }
}
