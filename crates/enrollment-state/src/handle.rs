//! SurrealDB Handle - Connection and Operations
//!
//! Manages the connection and provides methods for:
//! - roster loading (students, courses) on behalf of the records system
//! - insert_enrollment with an atomically generated identifier
//! - the per-student course listing with outer-join semantics
//!
//! Supports in-memory, remote (WebSocket) and local file-backed connections.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{StateError, StorageError};
use crate::migrations;
use crate::schema::{CourseRow, EnrollmentRow, StudentCourseRow, StudentRow};
use crate::storage_traits::{
    Course, CourseId, Enrollment, EnrollmentId, Student, StudentCourse, StudentId, StorageResult,
};
use crate::Result;
use serde::Deserialize;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::Surreal;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const DEFAULT_NAMESPACE: &str = "school";
const DEFAULT_DATABASE: &str = "enrollment";
const DEFAULT_LOCAL_PATH: &str = ".enrollment/db";

const MISSING_STUDENT: &str = "enrollment references a missing student";
const MISSING_COURSE: &str = "enrollment references a missing course";

/// Checks both references, draws the next id and inserts, all in one
/// transaction. The id is read back from the CREATE itself.
const REGISTER_ENROLLMENT: &str = r#"
    BEGIN TRANSACTION;
    LET $students = (SELECT VALUE student_id FROM students WHERE student_id = $student_id);
    IF array::len($students) == 0 { THROW "enrollment references a missing student" };
    LET $courses = (SELECT VALUE course_id FROM courses WHERE course_id = $course_id);
    IF array::len($courses) == 0 { THROW "enrollment references a missing course" };
    LET $next = (UPSERT sequences:enrollments SET value = (value OR 0) + 1 RETURN VALUE value)[0];
    CREATE enrollments CONTENT {
        enrollment_id: $next,
        student_id: $student_id,
        course_id: $course_id,
        registered_at: time::now()
    } RETURN enrollment_id;
    COMMIT TRANSACTION;
"#;

const STUDENT_COURSES: &str = r#"
    SELECT
        enrollment_id,
        (SELECT VALUE course_name FROM courses WHERE course_id = $parent.course_id LIMIT 1)[0] AS course_name,
        (SELECT VALUE full_name FROM students WHERE student_id = $parent.student_id LIMIT 1)[0] AS full_name,
        (SELECT VALUE email FROM students WHERE student_id = $parent.student_id LIMIT 1)[0] AS email
    FROM enrollments
    WHERE student_id = $student_id
    ORDER BY enrollment_id ASC
"#;

/// Configuration for a remote SurrealDB connection
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// WebSocket endpoint URL (e.g., "wss://xxx.aws-use1.surrealdb.cloud")
    pub endpoint: String,
    /// Database username
    pub username: String,
    /// Database password
    pub password: String,
    /// Namespace (default: "school")
    pub namespace: String,
    /// Database name (default: "enrollment")
    pub database: String,
    /// Whether this is a root user (true) or database user (false)
    pub is_root: bool,
}

impl RemoteConfig {
    /// Read the remote connection from `SURREALDB_*` environment variables.
    ///
    /// `SURREALDB_ENDPOINT`, `SURREALDB_USERNAME` and `SURREALDB_PASSWORD` are
    /// required. `SURREALDB_NAMESPACE` and `SURREALDB_DATABASE` default to
    /// `school` / `enrollment`; `SURREALDB_ROOT=true` signs in as root.
    pub fn from_env() -> std::result::Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> std::result::Result<Self, String> {
        let required = |key: &str| lookup(key).ok_or_else(|| format!("{key} not set"));

        Ok(Self {
            endpoint: required("SURREALDB_ENDPOINT")?,
            username: required("SURREALDB_USERNAME")?,
            password: required("SURREALDB_PASSWORD")?,
            namespace: lookup("SURREALDB_NAMESPACE")
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            database: lookup("SURREALDB_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            is_root: lookup("SURREALDB_ROOT")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

/// SurrealDB connection handle for enrollment records.
///
/// Clones share the underlying client and the sequence gate.
#[derive(Clone)]
pub struct SurrealHandle {
    db: Surreal<Any>,
    /// Serializes sequence bumps issued through this process.
    sequence_gate: Arc<Mutex<()>>,
}

#[derive(Deserialize)]
struct GeneratedId {
    enrollment_id: u64,
}

#[derive(Deserialize)]
struct CountRow {
    total: u64,
}

impl SurrealHandle {
    /// Connect to SurrealDB in-memory and set up schema
    #[instrument(skip_all)]
    pub async fn setup_db() -> Result<Self> {
        info!("Connecting to SurrealDB (in-memory)");
        Self::connect("mem://", DEFAULT_NAMESPACE, DEFAULT_DATABASE).await
    }

    /// Connect to a remote SurrealDB instance, signing in as root or as a
    /// database user depending on `config.is_root`.
    #[instrument(skip(config), fields(endpoint = %config.endpoint, namespace = %config.namespace, database = %config.database))]
    pub async fn setup_remote(config: RemoteConfig) -> Result<Self> {
        info!("Connecting to remote SurrealDB (root={})", config.is_root);

        let db = surrealdb::engine::any::connect(&config.endpoint)
            .await
            .map_err(|e| {
                StateError::Connection(format!("Failed to connect to {}: {}", config.endpoint, e))
            })?;

        if config.is_root {
            db.signin(Root {
                username: &config.username,
                password: &config.password,
            })
            .await
            .map_err(|e| StateError::Connection(format!("Root authentication failed: {}", e)))?;
        } else {
            db.signin(Database {
                namespace: &config.namespace,
                database: &config.database,
                username: &config.username,
                password: &config.password,
            })
            .await
            .map_err(|e| {
                StateError::Connection(format!("Database authentication failed: {}", e))
            })?;
        }

        Self::select_and_migrate(db, &config.namespace, &config.database).await
    }

    /// Connect using environment variables
    ///
    /// If SURREALDB_ENDPOINT is set, connects to that remote instance.
    /// If SURREALDB_URL is set, connects to that URL.
    /// Otherwise persists locally under ENROLLMENT_DB_PATH (default `.enrollment/db`).
    #[instrument(skip_all)]
    pub async fn setup_from_env() -> Result<Self> {
        if let Ok(config) = RemoteConfig::from_env() {
            info!("Remote config found, connecting to {}", config.endpoint);
            return Self::setup_remote(config).await;
        }

        if let Ok(url) = std::env::var("SURREALDB_URL") {
            info!("SURREALDB_URL found, connecting to {}", url);
            return Self::connect(&url, DEFAULT_NAMESPACE, DEFAULT_DATABASE).await;
        }

        let path = std::env::var("ENROLLMENT_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOCAL_PATH));
        std::fs::create_dir_all(&path).map_err(|e| {
            StateError::Connection(format!(
                "Failed to create database directory {}: {}",
                path.display(),
                e
            ))
        })?;
        let url = format!("surrealkv://{}", path.display());
        info!("No remote config found, using local persistence: {}", url);

        Self::connect(&url, DEFAULT_NAMESPACE, DEFAULT_DATABASE).await
    }

    async fn connect(url: &str, namespace: &str, database: &str) -> Result<Self> {
        let db = surrealdb::engine::any::connect(url)
            .await
            .map_err(|e| StateError::Connection(format!("Failed to connect to {}: {}", url, e)))?;

        Self::select_and_migrate(db, namespace, database).await
    }

    async fn select_and_migrate(db: Surreal<Any>, namespace: &str, database: &str) -> Result<Self> {
        db.use_ns(namespace).use_db(database).await.map_err(|e| {
            StateError::Connection(format!("Failed to select namespace/database: {}", e))
        })?;

        migrations::init_schema(&db).await?;

        info!("SurrealDB connected and schema initialized");
        Ok(SurrealHandle {
            db,
            sequence_gate: Arc::new(Mutex::new(())),
        })
    }

    // ========== Roster Operations ==========

    /// Insert or replace a student record
    #[instrument(skip(self, student), fields(student_id = %student.id))]
    pub async fn save_student(&self, student: &Student) -> StorageResult<Student> {
        if !student.id.is_storable() {
            return Err(StorageError::IdOutOfRange {
                entity: "student",
                id: student.id.get(),
            });
        }
        debug!("Saving student");

        let mut result = self
            .db
            .query("UPSERT type::thing('students', $key) CONTENT $row")
            .bind(("key", student.id.get()))
            .bind(("row", StudentRow::from(student)))
            .await?;

        let saved: Vec<StudentRow> = result.take(0)?;
        saved
            .into_iter()
            .next()
            .map(Student::from)
            .ok_or_else(|| StorageError::Backend("failed to save student".to_string()))
    }

    /// Insert or replace a course record
    #[instrument(skip(self, course), fields(course_id = %course.id))]
    pub async fn save_course(&self, course: &Course) -> StorageResult<Course> {
        if !course.id.is_storable() {
            return Err(StorageError::IdOutOfRange {
                entity: "course",
                id: course.id.get(),
            });
        }
        debug!("Saving course");

        let mut result = self
            .db
            .query("UPSERT type::thing('courses', $key) CONTENT $row")
            .bind(("key", course.id.get()))
            .bind(("row", CourseRow::from(course)))
            .await?;

        let saved: Vec<CourseRow> = result.take(0)?;
        saved
            .into_iter()
            .next()
            .map(Course::from)
            .ok_or_else(|| StorageError::Backend("failed to save course".to_string()))
    }

    /// Get a student by id
    #[instrument(skip(self))]
    pub async fn get_student(&self, student_id: StudentId) -> StorageResult<Option<Student>> {
        if !student_id.is_storable() {
            return Ok(None);
        }
        let mut result = self
            .db
            .query("SELECT * FROM students WHERE student_id = $id")
            .bind(("id", student_id.get()))
            .await?;

        let students: Vec<StudentRow> = result.take(0)?;
        Ok(students.into_iter().next().map(Student::from))
    }

    /// Get a course by id
    #[instrument(skip(self))]
    pub async fn get_course(&self, course_id: CourseId) -> StorageResult<Option<Course>> {
        if !course_id.is_storable() {
            return Ok(None);
        }
        let mut result = self
            .db
            .query("SELECT * FROM courses WHERE course_id = $id")
            .bind(("id", course_id.get()))
            .await?;

        let courses: Vec<CourseRow> = result.take(0)?;
        Ok(courses.into_iter().next().map(Course::from))
    }

    /// Delete a student by id. Existing enrollments are left in place.
    #[instrument(skip(self))]
    pub async fn delete_student(&self, student_id: StudentId) -> StorageResult<()> {
        if !student_id.is_storable() {
            return Err(StorageError::StudentNotFound { student_id });
        }
        debug!("Deleting student");

        let mut result = self
            .db
            .query("DELETE students WHERE student_id = $id RETURN BEFORE")
            .bind(("id", student_id.get()))
            .await?;

        let deleted: Vec<StudentRow> = result.take(0)?;
        if deleted.is_empty() {
            return Err(StorageError::StudentNotFound { student_id });
        }

        Ok(())
    }

    /// Delete a course by id. Existing enrollments are left in place.
    #[instrument(skip(self))]
    pub async fn delete_course(&self, course_id: CourseId) -> StorageResult<()> {
        if !course_id.is_storable() {
            return Err(StorageError::CourseNotFound { course_id });
        }
        debug!("Deleting course");

        let mut result = self
            .db
            .query("DELETE courses WHERE course_id = $id RETURN BEFORE")
            .bind(("id", course_id.get()))
            .await?;

        let deleted: Vec<CourseRow> = result.take(0)?;
        if deleted.is_empty() {
            return Err(StorageError::CourseNotFound { course_id });
        }

        Ok(())
    }

    // ========== Enrollment Operations ==========

    /// Create an enrollment and return the identifier generated for it.
    ///
    /// Reference checks, the sequence bump and the insert share one
    /// transaction, so the returned id always belongs to this row.
    #[instrument(skip(self), fields(student_id = %student_id, course_id = %course_id))]
    pub async fn insert_enrollment(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> StorageResult<EnrollmentId> {
        // No stored roster row can carry an id past the signed range.
        if !student_id.is_storable() {
            return Err(StorageError::MissingReference {
                entity: "student",
                id: student_id.get(),
            });
        }
        if !course_id.is_storable() {
            return Err(StorageError::MissingReference {
                entity: "course",
                id: course_id.get(),
            });
        }

        let _gate = self.sequence_gate.lock().await;
        debug!("Inserting enrollment");

        let mut response = self
            .db
            .query(REGISTER_ENROLLMENT)
            .bind(("student_id", student_id.get()))
            .bind(("course_id", course_id.get()))
            .await?;

        let errors = response.take_errors();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.into_values().map(|e| e.to_string()).collect();
            if messages.iter().any(|m| m.contains(MISSING_STUDENT)) {
                return Err(StorageError::MissingReference {
                    entity: "student",
                    id: student_id.get(),
                });
            }
            if messages.iter().any(|m| m.contains(MISSING_COURSE)) {
                return Err(StorageError::MissingReference {
                    entity: "course",
                    id: course_id.get(),
                });
            }
            warn!("Enrollment transaction failed: {}", messages.join("; "));
            return Err(StorageError::Backend(messages.join("; ")));
        }

        let last = response.num_statements().saturating_sub(1);
        let created: Option<GeneratedId> = response.take(last)?;
        let enrollment_id = created
            .map(|row| EnrollmentId(row.enrollment_id))
            .ok_or_else(|| StorageError::Backend("enrollment insert returned no row".to_string()))?;

        info!(enrollment_id = %enrollment_id, "Enrollment created");
        Ok(enrollment_id)
    }

    /// List a student's enrollments with course name and student contact.
    #[instrument(skip(self))]
    pub async fn student_courses(&self, student_id: StudentId) -> StorageResult<Vec<StudentCourse>> {
        if !student_id.is_storable() {
            return Ok(Vec::new());
        }
        let mut result = self
            .db
            .query(STUDENT_COURSES)
            .bind(("student_id", student_id.get()))
            .await?;

        let rows: Vec<StudentCourseRow> = result.take(0)?;
        debug!("Found {} enrollments", rows.len());
        Ok(rows.into_iter().map(StudentCourse::from).collect())
    }

    /// Get an enrollment by id
    #[instrument(skip(self))]
    pub async fn get_enrollment(
        &self,
        enrollment_id: EnrollmentId,
    ) -> StorageResult<Option<Enrollment>> {
        if !enrollment_id.is_storable() {
            return Ok(None);
        }
        let mut result = self
            .db
            .query("SELECT * FROM enrollments WHERE enrollment_id = $id")
            .bind(("id", enrollment_id.get()))
            .await?;

        let rows: Vec<EnrollmentRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(Enrollment::from))
    }

    /// Count enrollments for a (student, course) pair
    #[instrument(skip(self))]
    pub async fn count_enrollments(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> StorageResult<u64> {
        if !student_id.is_storable() || !course_id.is_storable() {
            return Ok(0);
        }
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM enrollments \
                 WHERE student_id = $student_id AND course_id = $course_id GROUP ALL",
            )
            .bind(("student_id", student_id.get()))
            .bind(("course_id", course_id.get()))
            .await?;

        let count: Option<CountRow> = result.take(0)?;
        Ok(count.map(|c| c.total).unwrap_or(0))
    }
}
