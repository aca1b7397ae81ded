//! Enroll - student course registration CLI
//!
//! ## Commands
//!
//! - `register`: register a student to a course, subject to the GPA rule
//! - `courses`: list a student's enrollments
//! - `import`: load a student/course roster exported by the records system

mod telemetry;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use enrollment_state::{
    Course, CourseId, EnrollmentId, EnrollmentQueryService, EnrollmentRegistrar,
    RegistrationError, Student, StudentCourse, StudentId, SurrealEnrollmentStore, SurrealHandle,
    SurrealRoster, MAX_STORED_ID,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "enroll")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Register students to courses and list their enrollments", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a student to a course if their GPA meets the course minimum
    Register {
        /// Student identifier
        #[arg(value_parser = clap::value_parser!(u64).range(..=MAX_STORED_ID))]
        student_id: u64,

        /// Course identifier
        #[arg(value_parser = clap::value_parser!(u64).range(..=MAX_STORED_ID))]
        course_id: u64,
    },

    /// List the courses a student is enrolled in
    Courses {
        /// Student identifier
        #[arg(value_parser = clap::value_parser!(u64).range(..=MAX_STORED_ID))]
        student_id: u64,

        /// Print the enrollments as a JSON array
        #[arg(long = "as-json")]
        as_json: bool,
    },

    /// Import students and courses from a JSON roster file
    Import {
        /// Roster file: {"students": [...], "courses": [...]}
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    telemetry::init_tracing(cli.json, telemetry::level_for(cli.verbose));

    let handle = Arc::new(
        SurrealHandle::setup_from_env()
            .await
            .context("Failed to connect to enrollment database")?,
    );

    match cli.command {
        Commands::Register {
            student_id,
            course_id,
        } => {
            let id = cmd_register(&handle, StudentId(student_id), CourseId(course_id)).await?;
            println!("Registered student {student_id} to course {course_id}: enrollment #{id}");
            Ok(())
        }
        Commands::Courses {
            student_id,
            as_json,
        } => cmd_courses(&handle, StudentId(student_id), as_json).await,
        Commands::Import { file } => {
            let (students, courses) = cmd_import(&handle, &file).await?;
            println!("Imported {students} students and {courses} courses from {file:?}");
            Ok(())
        }
    }
}

/// Register a student to a course by id.
///
/// An eligibility denial is returned as-is so its reason is what the user
/// sees; storage failures carry extra context.
async fn cmd_register(
    handle: &Arc<SurrealHandle>,
    student_id: StudentId,
    course_id: CourseId,
) -> Result<EnrollmentId> {
    let roster = SurrealRoster::new(handle.clone());
    let registrar = EnrollmentRegistrar::new(Arc::new(SurrealEnrollmentStore::new(
        handle.clone(),
    )));

    match registrar
        .register_by_ids(student_id, course_id, &roster, &roster)
        .await
    {
        Ok(id) => Ok(id),
        Err(err @ RegistrationError::Ineligible { .. }) => Err(err.into()),
        Err(err) => Err(anyhow::Error::new(err).context(format!(
            "Failed to register student {student_id} to course {course_id}"
        ))),
    }
}

/// Print a student's enrollments.
async fn cmd_courses(handle: &Arc<SurrealHandle>, student_id: StudentId, json: bool) -> Result<()> {
    let service = EnrollmentQueryService::new(Arc::new(SurrealEnrollmentStore::new(
        handle.clone(),
    )));
    let courses = service
        .get_student_courses(student_id)
        .await
        .context(format!("Failed to list courses for student {student_id}"))?;
    debug!(student_id = %student_id, count = courses.len(), "listed enrollments");

    if json {
        println!("{}", serde_json::to_string_pretty(&courses)?);
    } else if courses.is_empty() {
        println!("Student {student_id} has no enrollments");
    } else {
        print!("{}", render_courses(&courses));
    }
    Ok(())
}

fn render_courses(courses: &[StudentCourse]) -> String {
    let mut out = String::new();
    for row in courses {
        out.push_str(&format!(
            "#{} {}  {} <{}>\n",
            row.enrollment_id,
            row.course_name.as_deref().unwrap_or("-"),
            row.student_name.as_deref().unwrap_or("-"),
            row.student_email.as_deref().unwrap_or("-"),
        ));
    }
    out
}

#[derive(Debug, Default, Deserialize)]
struct RosterFile {
    #[serde(default)]
    students: Vec<Student>,
    #[serde(default)]
    courses: Vec<Course>,
}

/// Load a roster file into the students and courses tables.
///
/// Returns the number of students and courses written.
async fn cmd_import(handle: &SurrealHandle, path: &Path) -> Result<(usize, usize)> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read roster file: {:?}", path))?;
    let roster: RosterFile =
        serde_json::from_str(&content).context("Failed to parse roster as JSON")?;

    for student in &roster.students {
        handle
            .save_student(student)
            .await
            .context(format!("Failed to save student {}", student.id))?;
    }
    for course in &roster.courses {
        handle
            .save_course(course)
            .await
            .context(format!("Failed to save course {}", course.id))?;
    }

    info!(
        students = roster.students.len(),
        courses = roster.courses.len(),
        "roster imported"
    );
    Ok((roster.students.len(), roster.courses.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = r#"{
        "students": [
            {"id": 1, "gpa": 3.6, "full_name": "Ada Lovelace", "email": "ada@example.edu"},
            {"id": 2, "gpa": 3.0, "full_name": "Charles Babbage", "email": "charles@example.edu"}
        ],
        "courses": [
            {"id": 10, "name": "Compilers", "min_gpa": 3.5}
        ]
    }"#;

    async fn imported() -> (Arc<SurrealHandle>, tempfile::TempDir) {
        let handle = Arc::new(SurrealHandle::setup_db().await.unwrap());
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("roster.json");
        std::fs::write(&path, ROSTER).unwrap();
        let counts = cmd_import(&handle, &path).await.unwrap();
        assert_eq!(counts, (2, 1));
        (handle, temp_dir)
    }

    #[tokio::test]
    async fn test_import_writes_roster() {
        let (handle, _dir) = imported().await;

        let ada = handle.get_student(StudentId(1)).await.unwrap().unwrap();
        assert_eq!(ada.full_name, "Ada Lovelace");
        let course = handle.get_course(CourseId(10)).await.unwrap().unwrap();
        assert_eq!(course.min_gpa, 3.5);
    }

    #[tokio::test]
    async fn test_import_rejects_malformed_roster() {
        let handle = SurrealHandle::setup_db().await.unwrap();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("roster.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = cmd_import(&handle, &path).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse roster"));
    }

    #[tokio::test]
    async fn test_register_then_list() {
        let (handle, _dir) = imported().await;

        let id = cmd_register(&handle, StudentId(1), CourseId(10))
            .await
            .unwrap();
        assert!(id.get() > 0);

        assert!(cmd_courses(&handle, StudentId(1), false).await.is_ok());
        assert!(cmd_courses(&handle, StudentId(1), true).await.is_ok());
    }

    #[tokio::test]
    async fn test_register_denied_reports_reason() {
        let (handle, _dir) = imported().await;

        let err = cmd_register(&handle, StudentId(2), CourseId(10))
            .await
            .unwrap_err();
        let reason = err.to_string();
        assert!(reason.contains("did not meet the minimum GPA requirement"));
        assert!(reason.contains("registration denied"));
    }

    #[tokio::test]
    async fn test_register_unknown_course_has_context() {
        let (handle, _dir) = imported().await;

        let err = cmd_register(&handle, StudentId(1), CourseId(99))
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("Failed to register student 1 to course 99"));
    }

    #[test]
    fn test_ids_beyond_storable_range_are_rejected_at_parse() {
        let err = Cli::try_parse_from(["enroll", "courses", "18446744073709551615"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        assert!(Cli::try_parse_from(["enroll", "register", "1", "9223372036854775808"]).is_err());

        let cli = Cli::try_parse_from(["enroll", "register", "9223372036854775807", "10"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Register { student_id, course_id: 10 } if student_id == MAX_STORED_ID
        ));
    }

    #[test]
    fn test_render_courses_marks_missing_values() {
        let rows = vec![
            StudentCourse {
                enrollment_id: EnrollmentId(1),
                course_name: Some("Compilers".to_string()),
                student_name: Some("Ada Lovelace".to_string()),
                student_email: Some("ada@example.edu".to_string()),
            },
            StudentCourse {
                enrollment_id: EnrollmentId(2),
                course_name: None,
                student_name: Some("Ada Lovelace".to_string()),
                student_email: None,
            },
        ];

        assert_eq!(
            render_courses(&rows),
            "#1 Compilers  Ada Lovelace <ada@example.edu>\n#2 -  Ada Lovelace <->\n"
        );
    }
}
