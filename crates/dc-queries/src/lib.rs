//! # dc-queries
//!
//! List operations over collections already fetched from the backend.
//!
//! The backend neither sorts, filters nor pages. Every table in the client
//! does that locally with the pieces in this crate.
//!
//! ## Structure
//!
//! - `columns` - Per-entity columns and their comparable values
//! - `sorts` - Sort direction and the stable, null-aware sort
//! - `filters` - Free-text and exact-match filters
//! - `query` - A filter + sort + page bundle applied in one pass
//!
//! ## Example
//!
//! ```
//! use dc_models::Project;
//! use dc_queries::{ListQuery, SortState};
//!
//! let projects = vec![
//!     Project { name: "Beta".into(), ..Default::default() },
//!     Project { name: "Alpha".into(), ..Default::default() },
//! ];
//! let page = ListQuery::new()
//!     .sort(SortState::asc("name"))
//!     .apply(&projects);
//! assert_eq!(page.items[0].name, "Alpha");
//! ```

pub mod columns;
pub mod filters;
pub mod query;
pub mod sorts;

pub use columns::{Column, Columns, SortValue};
pub use filters::{FieldFilter, Filter};
pub use query::ListQuery;
pub use sorts::{sort_items, SortDirection, SortState};
