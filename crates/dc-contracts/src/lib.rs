//! # dc-contracts
//!
//! Client-side validation for DocConstruct RS.
//!
//! Contracts run before any request leaves the client. A failed contract
//! returns the collected [`ValidationErrors`](dc_core::ValidationErrors)
//! and no network call is made.

pub mod base;
pub mod projects;
pub mod professionals;
pub mod municipalities;
pub mod accounts;
pub mod wizard;

pub use base::*;
