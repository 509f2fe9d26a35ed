//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! Everything is nested under `/api/v1`:
//!
//! - **Authentication** (`/auth/*`): register, login, logout
//! - **Student** (`/student/assignments*`): drafts, edits, submission
//! - **Teacher** (`/teacher/assignments*`): handing out work, grading
//! - **Principal** (`/principal/*`): school-wide review, regrading, teacher directory, reports
//!
//! All endpoints are documented with `utoipa`; the rendered docs live at `/docs`.

pub mod handlers;
pub mod models;
