//! Enrollment-State: student course registration on SurrealDB
//!
//! This crate records which students are registered to which courses,
//! enforces the minimum-GPA eligibility rule at registration time and answers
//! queries about a student's course load.
//!
//! ## Key Components
//!
//! - `EnrollmentRegistrar`: eligibility check + enrollment insert
//! - `EnrollmentQueryService`: a student's courses with outer-join semantics
//! - `SurrealHandle`: connection, schema and statements
//! - `storage_traits`: the store and roster seams, with in-memory `fakes`

mod error;
pub mod fakes;
mod handle;
mod migrations;
mod query;
mod registrar;
mod schema;
pub mod storage_traits;
mod surreal_store;

pub use error::{RegistrationError, StateError, StorageError};
pub use handle::{RemoteConfig, SurrealHandle};
pub use query::EnrollmentQueryService;
pub use registrar::{check_eligibility, EnrollmentRegistrar};
pub use storage_traits::{
    Course, CourseId, CourseProvider, Enrollment, EnrollmentId, EnrollmentStore, StorageResult,
    Student, StudentCourse, StudentId, StudentProvider, MAX_STORED_ID,
};
pub use surreal_store::{SurrealEnrollmentStore, SurrealRoster};

/// Result type for connection and schema setup
pub type Result<T> = std::result::Result<T, StateError>;
