//! Storage trait definitions for enrollment records
//!
//! These traits define the storage seams the registrar and query service are
//! written against:
//! - `StudentProvider`: read-only access to student records
//! - `CourseProvider`: read-only access to course records
//! - `EnrollmentStore`: enrollment persistence and the per-student course query
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Largest identifier a store can hold. SurrealDB integers are signed 64-bit.
pub const MAX_STORED_ID: u64 = i64::MAX as u64;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw numeric value.
            pub fn get(self) -> u64 {
                self.0
            }

            /// Whether a store can hold this id (at most [`MAX_STORED_ID`]).
            pub fn is_storable(self) -> bool {
                self.0 <= MAX_STORED_ID
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                $name(value)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a student record, assigned by the records system
    StudentId
);
numeric_id!(
    /// Identifier of a course record, assigned by the records system
    CourseId
);
numeric_id!(
    /// Identifier of an enrollment, generated by the store on insert.
    ///
    /// Always positive; zero is never issued.
    EnrollmentId
);

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A student as seen by the enrollment core (read-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub gpa: f64,
    pub full_name: String,
    pub email: String,
}

impl Student {
    pub fn new(
        id: impl Into<StudentId>,
        gpa: f64,
        full_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            gpa,
            full_name: full_name.into(),
            email: email.into(),
        }
    }
}

/// A course as seen by the enrollment core (read-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub min_gpa: f64,
}

impl Course {
    pub fn new(id: impl Into<CourseId>, name: impl Into<String>, min_gpa: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            min_gpa,
        }
    }
}

/// A persisted enrollment linking one student to one course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: StudentId,
    pub course_id: CourseId,
    pub registered_at: DateTime<Utc>,
}

/// One row of a student's course listing.
///
/// Built with outer-join semantics: a course or student that no longer exists
/// leaves its fields as `None` instead of dropping the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentCourse {
    pub enrollment_id: EnrollmentId,
    pub course_name: Option<String>,
    pub student_name: Option<String>,
    pub student_email: Option<String>,
}

// ---------------------------------------------------------------------------
// Providers (owned by the external records system)
// ---------------------------------------------------------------------------

/// Read-only access to student records.
#[async_trait]
pub trait StudentProvider: Send + Sync {
    /// Look up a student. `Ok(None)` when no such student exists.
    async fn get_student(&self, student_id: StudentId) -> StorageResult<Option<Student>>;
}

/// Read-only access to course records.
#[async_trait]
pub trait CourseProvider: Send + Sync {
    /// Look up a course. `Ok(None)` when no such course exists.
    async fn get_course(&self, course_id: CourseId) -> StorageResult<Option<Course>>;
}

// ---------------------------------------------------------------------------
// EnrollmentStore
// ---------------------------------------------------------------------------

/// Enrollment persistence.
///
/// Guarantees:
/// - `insert_enrollment` returns the identifier assigned to *that* insert,
///   read atomically with it, even under concurrent callers.
/// - Identifiers are positive and never reissued.
/// - An insert referencing a missing student or course fails with
///   `StorageError::MissingReference` and creates nothing.
/// - Duplicate (student, course) pairs are accepted as separate enrollments.
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Create an enrollment and return its generated identifier.
    async fn insert_enrollment(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> StorageResult<EnrollmentId>;

    /// All enrollments of a student joined with course and student fields,
    /// ordered by enrollment id. Empty when there are none.
    async fn student_courses(&self, student_id: StudentId) -> StorageResult<Vec<StudentCourse>>;

    /// Fetch one enrollment by id.
    async fn get_enrollment(&self, enrollment_id: EnrollmentId)
        -> StorageResult<Option<Enrollment>>;

    /// Number of enrollments recorded for a (student, course) pair.
    async fn count_enrollments(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> StorageResult<u64>;
}
