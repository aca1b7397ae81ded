//! SurrealDB-backed implementations of the storage traits
//!
//! Thin adapters over a shared [`SurrealHandle`]; all statements live on the
//! handle.

use std::sync::Arc;

use async_trait::async_trait;

use crate::storage_traits::{
    Course, CourseId, CourseProvider, Enrollment, EnrollmentId, EnrollmentStore, Student,
    StudentCourse, StudentId, StudentProvider, StorageResult,
};
use crate::SurrealHandle;

/// SurrealDB-backed implementation of [`EnrollmentStore`].
#[derive(Clone)]
pub struct SurrealEnrollmentStore {
    handle: Arc<SurrealHandle>,
}

impl SurrealEnrollmentStore {
    pub fn new(handle: Arc<SurrealHandle>) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl EnrollmentStore for SurrealEnrollmentStore {
    async fn insert_enrollment(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> StorageResult<EnrollmentId> {
        self.handle.insert_enrollment(student_id, course_id).await
    }

    async fn student_courses(&self, student_id: StudentId) -> StorageResult<Vec<StudentCourse>> {
        self.handle.student_courses(student_id).await
    }

    async fn get_enrollment(
        &self,
        enrollment_id: EnrollmentId,
    ) -> StorageResult<Option<Enrollment>> {
        self.handle.get_enrollment(enrollment_id).await
    }

    async fn count_enrollments(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> StorageResult<u64> {
        self.handle.count_enrollments(student_id, course_id).await
    }
}

/// SurrealDB-backed student and course lookups.
#[derive(Clone)]
pub struct SurrealRoster {
    handle: Arc<SurrealHandle>,
}

impl SurrealRoster {
    pub fn new(handle: Arc<SurrealHandle>) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl StudentProvider for SurrealRoster {
    async fn get_student(&self, student_id: StudentId) -> StorageResult<Option<Student>> {
        self.handle.get_student(student_id).await
    }
}

#[async_trait]
impl CourseProvider for SurrealRoster {
    async fn get_course(&self, course_id: CourseId) -> StorageResult<Option<Course>> {
        self.handle.get_course(course_id).await
    }
}
