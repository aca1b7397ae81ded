//! Shared fixtures: the same contract runs against the in-memory fakes and
//! the in-memory SurrealDB backend.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use enrollment_state::fakes::{MemoryEnrollmentStore, MemoryRoster};
use enrollment_state::{
    Course, CourseId, Enrollment, EnrollmentId, EnrollmentStore, StorageError, StorageResult,
    Student, StudentCourse, StudentId, SurrealEnrollmentStore, SurrealHandle,
};

pub enum Roster {
    Memory(Arc<MemoryRoster>),
    Surreal(Arc<SurrealHandle>),
}

impl Roster {
    pub async fn add_student(&self, student: Student) {
        match self {
            Roster::Memory(roster) => roster.put_student(student).unwrap(),
            Roster::Surreal(handle) => {
                handle.save_student(&student).await.unwrap();
            }
        }
    }

    pub async fn add_course(&self, course: Course) {
        match self {
            Roster::Memory(roster) => roster.put_course(course).unwrap(),
            Roster::Surreal(handle) => {
                handle.save_course(&course).await.unwrap();
            }
        }
    }

    pub async fn remove_student(&self, student_id: StudentId) {
        match self {
            Roster::Memory(roster) => roster.remove_student(student_id).unwrap(),
            Roster::Surreal(handle) => handle.delete_student(student_id).await.unwrap(),
        }
    }

    pub async fn remove_course(&self, course_id: CourseId) {
        match self {
            Roster::Memory(roster) => roster.remove_course(course_id).unwrap(),
            Roster::Surreal(handle) => handle.delete_course(course_id).await.unwrap(),
        }
    }
}

pub struct Fixture {
    pub roster: Roster,
    pub store: Arc<dyn EnrollmentStore>,
}

pub async fn memory() -> Fixture {
    let roster = Arc::new(MemoryRoster::new());
    let store = Arc::new(MemoryEnrollmentStore::new(roster.clone()));
    Fixture {
        roster: Roster::Memory(roster),
        store,
    }
}

pub async fn surreal() -> Fixture {
    let handle = Arc::new(SurrealHandle::setup_db().await.unwrap());
    let store = Arc::new(SurrealEnrollmentStore::new(handle.clone()));
    Fixture {
        roster: Roster::Surreal(handle),
        store,
    }
}

pub fn ada() -> Student {
    Student::new(1, 3.6, "Ada Lovelace", "ada@example.edu")
}

pub fn compilers() -> Course {
    Course::new(10, "Compilers", 3.5)
}

/// A store whose backend is unreachable.
pub struct UnreachableStore;

#[async_trait]
impl EnrollmentStore for UnreachableStore {
    async fn insert_enrollment(
        &self,
        _student_id: StudentId,
        _course_id: CourseId,
    ) -> StorageResult<EnrollmentId> {
        Err(StorageError::Backend("connection refused".to_string()))
    }

    async fn student_courses(&self, _student_id: StudentId) -> StorageResult<Vec<StudentCourse>> {
        Err(StorageError::Backend("connection refused".to_string()))
    }

    async fn get_enrollment(
        &self,
        _enrollment_id: EnrollmentId,
    ) -> StorageResult<Option<Enrollment>> {
        Err(StorageError::Backend("connection refused".to_string()))
    }

    async fn count_enrollments(
        &self,
        _student_id: StudentId,
        _course_id: CourseId,
    ) -> StorageResult<u64> {
        Err(StorageError::Backend("connection refused".to_string()))
    }
}
