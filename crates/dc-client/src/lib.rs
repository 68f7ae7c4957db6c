//! # dc-client
//!
//! The single API client for the DocConstruct backend.
//!
//! Resource calls are split across one trait per area ([`ProjectsApi`],
//! [`ProfessionalsApi`], ...). [`HttpApi`] speaks to the real backend over
//! reqwest; [`MemoryApi`] keeps everything in process for tests and
//! offline runs.

pub mod api;
pub mod envelope;
pub mod error;
pub mod http;
pub mod memory;
pub mod routes;
pub mod upload;

pub use api::*;
pub use error::{ApiError, ErrorBody, REMOTE_RESOURCE};
pub use http::HttpApi;
pub use memory::MemoryApi;
pub use upload::{load_file, save_file};
