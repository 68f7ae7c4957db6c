//! Project contracts

pub mod base;
pub mod create;
pub mod update;

pub use base::*;
pub use create::*;
pub use update::*;
