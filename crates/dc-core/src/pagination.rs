//! Client-side pagination
//!
//! The backend returns whole collections; pages are cut locally.

use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: usize,

    /// Items per page
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    20
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageRequest {
    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 1000),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page.max(1) - 1) * self.per_page
    }
}

/// One page of a locally held collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Current page, clamped into `1..=total_pages`
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cut one page out of `items`.
///
/// A page past the end is clamped to the last page; an empty collection
/// yields page 1 of 1 with no items.
pub fn paginate<T: Clone>(items: &[T], request: PageRequest) -> Page<T> {
    let per_page = request.per_page.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(per_page).max(1);
    let page = request.page.clamp(1, total_pages);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total);

    Page {
        items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
        page,
        per_page,
        total,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(0, 0);
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, 1);
        assert_eq!(PageRequest::new(3, 4).offset(), 8);
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=10).collect();

        let first = paginate(&items, PageRequest::new(1, 4));
        assert_eq!(first.items, vec![1, 2, 3, 4]);
        assert_eq!(first.total_pages, 3);
        assert!(first.has_next());
        assert!(!first.has_previous());

        let last = paginate(&items, PageRequest::new(3, 4));
        assert_eq!(last.items, vec![9, 10]);
        assert!(!last.has_next());

        let past_end = paginate(&items, PageRequest::new(9, 4));
        assert_eq!(past_end.page, 3);
    }

    #[test]
    fn test_paginate_empty() {
        let items: Vec<u32> = vec![];
        let page = paginate(&items, PageRequest::new(2, 4));
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.is_empty());
    }
}
