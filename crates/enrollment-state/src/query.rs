//! Enrollment Query Service

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::storage_traits::{EnrollmentStore, StorageResult, StudentCourse, StudentId};

/// Answers questions about a student's course load.
#[derive(Clone)]
pub struct EnrollmentQueryService {
    store: Arc<dyn EnrollmentStore>,
}

impl EnrollmentQueryService {
    pub fn new(store: Arc<dyn EnrollmentStore>) -> Self {
        Self { store }
    }

    /// Courses the student is enrolled in, with course name and student contact.
    ///
    /// Unknown students and students without enrollments both yield an empty
    /// list. Rows whose course or student record is gone are kept, with the
    /// missing side left as `None`.
    #[instrument(skip(self))]
    pub async fn get_student_courses(
        &self,
        student_id: StudentId,
    ) -> StorageResult<Vec<StudentCourse>> {
        let courses = self.store.student_courses(student_id).await?;
        debug!(count = courses.len(), "Student courses loaded");
        Ok(courses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{MemoryEnrollmentStore, MemoryRoster};
    use crate::storage_traits::{Course, CourseId, Student};

    #[tokio::test]
    async fn lists_enrollments_in_insertion_order() {
        let roster = Arc::new(MemoryRoster::new());
        roster
            .put_student(Student::new(1, 3.8, "Ada", "ada@example.edu"))
            .unwrap();
        roster.put_course(Course::new(20, "Logic", 3.0)).unwrap();
        roster.put_course(Course::new(10, "Algebra", 2.0)).unwrap();
        let store = Arc::new(MemoryEnrollmentStore::new(roster));
        store
            .insert_enrollment(StudentId(1), CourseId(20))
            .await
            .unwrap();
        store
            .insert_enrollment(StudentId(1), CourseId(10))
            .await
            .unwrap();

        let service = EnrollmentQueryService::new(store);
        let courses = service.get_student_courses(StudentId(1)).await.unwrap();

        let names: Vec<_> = courses
            .iter()
            .map(|c| c.course_name.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["Logic", "Algebra"]);
        assert!(courses
            .iter()
            .all(|c| c.student_email.as_deref() == Some("ada@example.edu")));
    }
}
