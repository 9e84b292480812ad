//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated caller from a Bearer access token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`rbac::RequireReviewer`] -- Requires `advisor` or `admin`.

pub mod auth;
pub mod rbac;
