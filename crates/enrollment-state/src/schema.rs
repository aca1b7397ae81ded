//! Row definitions for the enrollment SurrealDB tables
//!
//! Tables:
//! - students: roster copy of student records (keyed `students:<id>`)
//! - courses: roster copy of course records (keyed `courses:<id>`)
//! - enrollments: one row per successful registration
//! - sequences: counters backing generated identifiers
//!
//! Rows convert to and from the `storage_traits` types at the boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage_traits::{
    Course, CourseId, Enrollment, EnrollmentId, Student, StudentCourse, StudentId,
};

/// Module for serializing chrono DateTime to SurrealDB datetime format
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Student row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRow {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub student_id: u64,
    pub full_name: String,
    pub email: String,
    pub gpa: f64,
}

impl From<&Student> for StudentRow {
    fn from(student: &Student) -> Self {
        StudentRow {
            id: None,
            student_id: student.id.get(),
            full_name: student.full_name.clone(),
            email: student.email.clone(),
            gpa: student.gpa,
        }
    }
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Student {
            id: StudentId(row.student_id),
            gpa: row.gpa,
            full_name: row.full_name,
            email: row.email,
        }
    }
}

/// Course row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseRow {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub course_id: u64,
    pub course_name: String,
    pub min_gpa: f64,
}

impl From<&Course> for CourseRow {
    fn from(course: &Course) -> Self {
        CourseRow {
            id: None,
            course_id: course.id.get(),
            course_name: course.name.clone(),
            min_gpa: course.min_gpa,
        }
    }
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Course {
            id: CourseId(row.course_id),
            name: row.course_name,
            min_gpa: row.min_gpa,
        }
    }
}

/// Enrollment row (the `attending` relation)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentRow {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    /// Generated identifier, drawn from `sequences:enrollments`
    pub enrollment_id: u64,
    pub student_id: u64,
    pub course_id: u64,
    #[serde(with = "surreal_datetime")]
    pub registered_at: DateTime<Utc>,
}

impl From<EnrollmentRow> for Enrollment {
    fn from(row: EnrollmentRow) -> Self {
        Enrollment {
            id: EnrollmentId(row.enrollment_id),
            student_id: StudentId(row.student_id),
            course_id: CourseId(row.course_id),
            registered_at: row.registered_at,
        }
    }
}

/// Projection returned by the student course listing query
#[derive(Debug, Clone, Deserialize)]
pub struct StudentCourseRow {
    pub enrollment_id: u64,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<StudentCourseRow> for StudentCourse {
    fn from(row: StudentCourseRow) -> Self {
        StudentCourse {
            enrollment_id: EnrollmentId(row.enrollment_id),
            course_name: row.course_name,
            student_name: row.full_name,
            student_email: row.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_row_round_trips_domain_fields() {
        let student = Student::new(11, 3.6, "Grace Hopper", "grace@example.edu");
        let row = StudentRow::from(&student);

        assert!(row.id.is_none());
        assert_eq!(row.student_id, 11);
        assert_eq!(Student::from(row), student);
    }

    #[test]
    fn test_course_row_renames_name_column() {
        let course = Course::new(4, "Compilers", 3.5);
        let json = serde_json::to_value(CourseRow::from(&course)).unwrap();

        assert_eq!(json["course_name"], "Compilers");
        assert_eq!(json["course_id"], 4);
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_student_course_row_tolerates_missing_join_fields() {
        let row: StudentCourseRow =
            serde_json::from_value(serde_json::json!({ "enrollment_id": 9, "full_name": "Ada" }))
                .unwrap();
        let listed = StudentCourse::from(row);

        assert_eq!(listed.enrollment_id, EnrollmentId(9));
        assert!(listed.course_name.is_none());
        assert_eq!(listed.student_name.as_deref(), Some("Ada"));
        assert!(listed.student_email.is_none());
    }
}
