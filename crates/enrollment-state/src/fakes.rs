//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryRoster` and `MemoryEnrollmentStore` that satisfy the trait
//! contracts without any external dependencies.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StorageError;
use crate::storage_traits::*;

fn lock<T>(mutex: &Mutex<T>) -> StorageResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| StorageError::Backend("in-memory store lock poisoned".to_string()))
}

// ---------------------------------------------------------------------------
// MemoryRoster
// ---------------------------------------------------------------------------

/// In-memory students and courses backed by two `HashMap`s.
#[derive(Debug, Default)]
pub struct MemoryRoster {
    students: Mutex<HashMap<StudentId, Student>>,
    courses: Mutex<HashMap<CourseId, Course>>,
}

impl MemoryRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a student.
    pub fn put_student(&self, student: Student) -> StorageResult<()> {
        if !student.id.is_storable() {
            return Err(StorageError::IdOutOfRange {
                entity: "student",
                id: student.id.get(),
            });
        }
        lock(&self.students)?.insert(student.id, student);
        Ok(())
    }

    /// Insert or replace a course.
    pub fn put_course(&self, course: Course) -> StorageResult<()> {
        if !course.id.is_storable() {
            return Err(StorageError::IdOutOfRange {
                entity: "course",
                id: course.id.get(),
            });
        }
        lock(&self.courses)?.insert(course.id, course);
        Ok(())
    }

    /// Remove a student, leaving enrollments that point at it.
    pub fn remove_student(&self, student_id: StudentId) -> StorageResult<()> {
        lock(&self.students)?
            .remove(&student_id)
            .map(|_| ())
            .ok_or(StorageError::StudentNotFound { student_id })
    }

    /// Remove a course, leaving enrollments that point at it.
    pub fn remove_course(&self, course_id: CourseId) -> StorageResult<()> {
        lock(&self.courses)?
            .remove(&course_id)
            .map(|_| ())
            .ok_or(StorageError::CourseNotFound { course_id })
    }
}

#[async_trait]
impl StudentProvider for MemoryRoster {
    async fn get_student(&self, student_id: StudentId) -> StorageResult<Option<Student>> {
        Ok(lock(&self.students)?.get(&student_id).cloned())
    }
}

#[async_trait]
impl CourseProvider for MemoryRoster {
    async fn get_course(&self, course_id: CourseId) -> StorageResult<Option<Course>> {
        Ok(lock(&self.courses)?.get(&course_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// MemoryEnrollmentStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct EnrollmentTable {
    last_id: u64,
    rows: BTreeMap<EnrollmentId, Enrollment>,
}

/// In-memory enrollment store.
///
/// Reference checks and joins go through the shared [`MemoryRoster`]. The id
/// is allocated under the same lock that inserts the row.
#[derive(Debug)]
pub struct MemoryEnrollmentStore {
    roster: Arc<MemoryRoster>,
    table: Mutex<EnrollmentTable>,
}

impl MemoryEnrollmentStore {
    pub fn new(roster: Arc<MemoryRoster>) -> Self {
        Self {
            roster,
            table: Mutex::new(EnrollmentTable::default()),
        }
    }

    /// Total number of enrollment rows.
    pub fn len(&self) -> StorageResult<usize> {
        Ok(lock(&self.table)?.rows.len())
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl EnrollmentStore for MemoryEnrollmentStore {
    async fn insert_enrollment(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> StorageResult<EnrollmentId> {
        if self.roster.get_student(student_id).await?.is_none() {
            return Err(StorageError::MissingReference {
                entity: "student",
                id: student_id.get(),
            });
        }
        if self.roster.get_course(course_id).await?.is_none() {
            return Err(StorageError::MissingReference {
                entity: "course",
                id: course_id.get(),
            });
        }

        let mut table = lock(&self.table)?;
        table.last_id += 1;
        let id = EnrollmentId(table.last_id);
        table.rows.insert(
            id,
            Enrollment {
                id,
                student_id,
                course_id,
                registered_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn student_courses(&self, student_id: StudentId) -> StorageResult<Vec<StudentCourse>> {
        let enrollments: Vec<Enrollment> = lock(&self.table)?
            .rows
            .values()
            .filter(|e| e.student_id == student_id)
            .cloned()
            .collect();

        let mut listing = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            let course = self.roster.get_course(enrollment.course_id).await?;
            let student = self.roster.get_student(enrollment.student_id).await?;
            listing.push(StudentCourse {
                enrollment_id: enrollment.id,
                course_name: course.map(|c| c.name),
                student_name: student.as_ref().map(|s| s.full_name.clone()),
                student_email: student.map(|s| s.email),
            });
        }
        Ok(listing)
    }

    async fn get_enrollment(
        &self,
        enrollment_id: EnrollmentId,
    ) -> StorageResult<Option<Enrollment>> {
        Ok(lock(&self.table)?.rows.get(&enrollment_id).cloned())
    }

    async fn count_enrollments(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> StorageResult<u64> {
        let table = lock(&self.table)?;
        Ok(table
            .rows
            .values()
            .filter(|e| e.student_id == student_id && e.course_id == course_id)
            .count() as u64)
    }
}
