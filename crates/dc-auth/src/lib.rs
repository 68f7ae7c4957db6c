//! # dc-auth
//!
//! Authentication state for DocConstruct RS.
//!
//! ## Features
//!
//! - Cookie-backed session persisted to disk or memory
//! - Login, logout and startup validation against the backend
//! - JWT payload inspection for early expiry detection
//! - Role-gated navigation and route guards

pub mod authenticator;
pub mod jwt;
pub mod permissions;
pub mod session;

pub use authenticator::{AuthBackend, AuthState, Authenticator, Redirect};
pub use jwt::{TokenClaims, TokenError};
pub use permissions::{CurrentUser, NavItem, RouteDecision};
pub use session::{
    Cookie, CookieJar, FileSessionStore, MemorySessionStore, Session, SessionError, SessionStore,
};
