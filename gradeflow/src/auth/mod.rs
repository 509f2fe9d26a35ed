//! Authentication and authorization.
//!
//! Sessions are stateless HS256 JWTs carried in `Authorization: Bearer <token>`. A token is
//! accepted when its signature and expiry check out, it is not on the revocation list, and the
//! user it names still exists. Logout puts the token on the revocation list until its own expiry.
//!
//! # Modules
//!
//! - [`current_user`]: Extractors for the authenticated user ([`current_user::CurrentSession`],
//!   and `CurrentUser` itself)
//! - [`password`]: Password hashing and verification using Argon2id
//! - [`permissions`]: Role checks and the `RequiresRole<R>` extractor
//! - [`session`]: Token issue and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use gradeflow::auth::permissions::{RequiresRole, role};
//!
//! async fn teacher_only(teacher: RequiresRole<role::Teacher>) -> String {
//!     format!("Hello, teacher {}!", teacher.role_id)
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod revocation;
pub mod session;
