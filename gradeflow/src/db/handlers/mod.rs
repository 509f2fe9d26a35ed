//! Repository implementations for database access.
//!
//! This module provides repository structs for each table in the system.
//! Repositories follow a consistent pattern and most implement the [`Repository`] trait.
//!
//! # Design Pattern
//!
//! Each repository:
//! - Wraps a SQLx connection or transaction
//! - Provides strongly-typed operations
//! - Returns domain models from [`crate::db::models`]
//! - Opens nested transactions on the wrapped connection when it needs several statements
//!
//! # Available Repositories
//!
//! - [`Users`]: User accounts, registration and lookup
//! - [`IdCounters`]: Monotonic id allocation for users and role-scoped ids
//! - [`Assignments`]: Assignment records and their conditional state transitions
//! - [`RevokedTokens`]: Session token revocation list
//!
//! # Common Pattern
//!
//! ```ignore
//! use gradeflow::db::handlers::{Users, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut conn = pool.acquire().await?;
//!     let mut repo = Users::new(&mut conn);
//!     let user = repo.get_by_email("someone@example.com").await?;
//!     Ok(())
//! }
//! ```

pub mod assignments;
pub mod id_counters;
pub mod repository;
pub mod revoked_tokens;
pub mod users;

pub use assignments::Assignments;
pub use id_counters::IdCounters;
pub use repository::Repository;
pub use revoked_tokens::RevokedTokens;
pub use users::Users;
