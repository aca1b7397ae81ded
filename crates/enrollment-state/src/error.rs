//! Error types for enrollment-state

use thiserror::Error;

use crate::storage_traits::{CourseId, StudentId};

/// Errors raised while connecting to the database or preparing its schema
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

/// Infrastructure failures reported by a store.
///
/// Never converted into a default value: every variant reaches the caller.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backend rejected or failed to run a statement
    #[error("storage backend error: {0}")]
    Backend(String),

    /// An enrollment would reference a row that does not exist
    #[error("enrollment references missing {entity} {id}")]
    MissingReference { entity: &'static str, id: u64 },

    /// A roster record carries an id no store can hold
    #[error("{entity} id {id} exceeds the storable range")]
    IdOutOfRange { entity: &'static str, id: u64 },

    /// Lookup of a student by id found nothing
    #[error("student {student_id} not found")]
    StudentNotFound { student_id: StudentId },

    /// Lookup of a course by id found nothing
    #[error("course {course_id} not found")]
    CourseNotFound { course_id: CourseId },
}

impl From<surrealdb::Error> for StorageError {
    fn from(err: surrealdb::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

/// Outcome of a failed registration.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// The student's GPA is below the course minimum. Business rule, not a fault.
    #[error(
        "student {student_id} did not meet the minimum GPA requirement for course {course_id} \
         (GPA {gpa:.2}, required {min_gpa:.2}); registration denied"
    )]
    Ineligible {
        student_id: StudentId,
        course_id: CourseId,
        gpa: f64,
        min_gpa: f64,
    },

    /// The store failed; the registration may not be assumed to have happened
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl RegistrationError {
    /// True for the business-rule rejection, false for infrastructure failures.
    pub fn is_ineligible(&self) -> bool {
        matches!(self, RegistrationError::Ineligible { .. })
    }
}
