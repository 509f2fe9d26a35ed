//! API request and response data models.
//!
//! These are the public wire contract and are kept separate from the database models in
//! [`crate::db::models`], so storage can change without changing the API.
//!
//! - [`auth`]: registration, login and logout payloads
//! - [`users`]: roles, the authenticated actor, and user representations
//! - [`assignments`]: assignment lifecycle requests, the success envelope, and report rows

pub mod assignments;
pub mod auth;
pub mod users;
