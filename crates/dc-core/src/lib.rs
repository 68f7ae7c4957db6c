//! # dc-core
//!
//! Core types, traits, and utilities for DocConstruct RS.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types
//! - Result type aliases
//! - Core traits (Identifiable, Timestamped, Named)
//! - Identifier and lenient serde helpers
//! - Client-side pagination
//! - Client configuration

pub mod error;
pub mod result;
pub mod traits;
pub mod types;
pub mod pagination;
pub mod config;

pub use error::*;
pub use result::*;
pub use traits::*;
pub use types::*;
pub use pagination::*;
