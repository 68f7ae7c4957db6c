//! # dc-models
//!
//! Canonical domain models for DocConstruct RS.
//!
//! The backend and the older frontends disagree on field spellings
//! (`project_name` vs `name`, `proffsional_*`, `template_id` vs `id`),
//! on enum spellings (`PRE_PERMIT` vs `Pre permit`) and on the shape of
//! nested data (a flat `professionals` array vs `professional_associations`
//! join rows). Every model here decodes all of them into one shape and
//! encodes that shape only.

pub mod status;
pub mod project;
pub mod professional;
pub mod municipality;
pub mod template;
pub mod document;
pub mod upload;
pub mod user;
pub mod survey;

pub use document::*;
pub use municipality::*;
pub use professional::*;
pub use project::*;
pub use status::*;
pub use survey::*;
pub use template::*;
pub use upload::UploadFile;
pub use user::*;
