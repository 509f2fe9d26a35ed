//! HTTP request handlers for all API endpoints.
//!
//! Handlers are thin: they declare the role they need with
//! [`RequiresRole`](crate::auth::permissions::RequiresRole), check for missing fields, and hand off to
//! [`crate::workflow`]. Errors are [`crate::errors::Error`], which renders the JSON error body.
//!
//! - [`index`]: public API landing document
//! - [`auth`]: register, login, logout
//! - [`students`]: draft authoring and submission
//! - [`teachers`]: handing out work and grading
//! - [`principals`]: review, regrade, teacher directory, reports

pub mod auth;
pub mod index;
pub mod principals;
pub mod students;
pub mod teachers;
