//! Common type definitions.
//!
//! # ID Types
//!
//! - [`UserId`]: global user identifier, allocated from the `user` counter
//! - [`RoleScopedId`]: identifier unique within one role (student, teacher or principal id)
//! - [`AssignmentId`]: assignment identifier (UUID)
//!
//! Numeric ids come from the `id_counters` table and are strictly increasing; they are never
//! reused, even when a registration transaction rolls back after allocating them.
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use uuid::Uuid;

// Type aliases for IDs
pub type UserId = i64;
pub type RoleScopedId = i64;
pub type AssignmentId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}
