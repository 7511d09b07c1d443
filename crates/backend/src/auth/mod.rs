//! Authentication for the API: password hashing, RS256 session tokens,
//! session cookies, and the middleware that gates routes on them.
//!
//! This module provides:
//! - `CredentialHasher` for Argon2id password hashes
//! - `TokenService` for access and refresh token creation and validation
//! - `require_auth` middleware resolving the caller to a `CurrentUser`
//! - `require_role` / `require_admin` middleware gating on the caller's role
//! - `AuthWorkflow` and the register, login, refresh and logout handlers

mod cookies;
mod handlers;
mod jwt;
mod middleware;
mod password;
mod roles;
mod service;
pub mod types;

pub use cookies::{
    extract_token_from_cookie, SessionCookies, ACCESS_COOKIE, LOGGED_IN_COOKIE, REFRESH_COOKIE,
};
pub use handlers::{login, logout, refresh, register};
pub use jwt::{issue, issue_at, validate, SigningKeys, TokenError, TokenService};
pub use middleware::{require_auth, resolve_identity};
pub use password::{CredentialHasher, HashError, HasherConfig};
pub use roles::{authorize, require_admin, require_role};
pub use service::{AuthWorkflow, SessionTokens};
pub use types::{Claims, CurrentUser};
