//! Enrollment Registrar
//!
//! Applies the eligibility rule (student GPA must meet the course minimum)
//! and persists an enrollment through the injected [`EnrollmentStore`].

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::error::{RegistrationError, StorageError};
use crate::storage_traits::{
    Course, CourseId, CourseProvider, EnrollmentId, EnrollmentStore, Student, StudentId,
    StudentProvider,
};

/// Check the eligibility rule without touching any store.
///
/// A non-finite GPA or minimum never satisfies the comparison.
pub fn check_eligibility(student: &Student, course: &Course) -> Result<(), RegistrationError> {
    if student.gpa >= course.min_gpa {
        Ok(())
    } else {
        Err(RegistrationError::Ineligible {
            student_id: student.id,
            course_id: course.id,
            gpa: student.gpa,
            min_gpa: course.min_gpa,
        })
    }
}

/// Registers students to courses.
#[derive(Clone)]
pub struct EnrollmentRegistrar {
    store: Arc<dyn EnrollmentStore>,
}

impl EnrollmentRegistrar {
    pub fn new(store: Arc<dyn EnrollmentStore>) -> Self {
        Self { store }
    }

    /// Register `student` to `course`, returning the new enrollment id.
    ///
    /// Ineligible students get [`RegistrationError::Ineligible`] and nothing is
    /// written. Store failures come back as [`RegistrationError::Storage`].
    #[instrument(skip(self, student, course), fields(student_id = %student.id, course_id = %course.id))]
    pub async fn register_student_to_course(
        &self,
        student: &Student,
        course: &Course,
    ) -> Result<EnrollmentId, RegistrationError> {
        if let Err(denied) = check_eligibility(student, course) {
            info!(
                gpa = student.gpa,
                min_gpa = course.min_gpa,
                "Registration denied"
            );
            return Err(denied);
        }

        match self.store.insert_enrollment(student.id, course.id).await {
            Ok(enrollment_id) => {
                info!(enrollment_id = %enrollment_id, "Student registered");
                Ok(enrollment_id)
            }
            Err(e) => {
                warn!(error = %e, "Registration failed in store");
                Err(e.into())
            }
        }
    }

    /// Resolve both records by id, then register.
    #[instrument(skip(self, students, courses))]
    pub async fn register_by_ids(
        &self,
        student_id: StudentId,
        course_id: CourseId,
        students: &dyn StudentProvider,
        courses: &dyn CourseProvider,
    ) -> Result<EnrollmentId, RegistrationError> {
        let student = students
            .get_student(student_id)
            .await?
            .ok_or(StorageError::StudentNotFound { student_id })?;
        let course = courses
            .get_course(course_id)
            .await?
            .ok_or(StorageError::CourseNotFound { course_id })?;

        self.register_student_to_course(&student, &course).await
    }
}
