//! Database record structures.
//!
//! These types mirror table rows (`FromRow` entities) and the request/response shapes the
//! repositories in [`crate::db::handlers`] accept and return. API-facing types live in
//! [`crate::api::models`] and convert from these.

pub mod assignments;
pub mod revoked_tokens;
pub mod users;
