//! SurrealDB schema migrations and initialization
//!
//! Sets up the roster tables, the enrollment table and the sequence table
//! with their constraints and indexes.

use crate::error::StateError;
use crate::Result;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

/// Initialize all enrollment tables in SurrealDB
///
/// Safe to call on every connection: every definition is `IF NOT EXISTS`.
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing enrollment schema");

    init_students_table(db).await?;
    init_courses_table(db).await?;
    init_enrollments_table(db).await?;
    init_sequences_table(db).await?;

    info!("Enrollment schema initialization complete");
    Ok(())
}

/// Run a block of definitions, surfacing per-statement errors.
async fn apply(db: &Surreal<Any>, table: &str, sql: &'static str) -> Result<()> {
    debug!("Initializing {} table", table);

    db.query(sql)
        .await
        .map_err(|e| StateError::SchemaSetup(format!("{table}: {e}")))?
        .check()
        .map_err(|e| StateError::SchemaSetup(format!("{table}: {e}")))?;

    info!("✓ {} table initialized", table);
    Ok(())
}

/// Initialize `students` table
///
/// Schema:
/// ```text
/// TABLE students {
///   student_id:  INT (unique)
///   full_name:   STRING
///   email:       STRING
///   gpa:         NUMBER
/// }
/// ```
///
/// Rows belong to the external records system and are only read here.
async fn init_students_table(db: &Surreal<Any>) -> Result<()> {
    let sql = r#"
        DEFINE TABLE IF NOT EXISTS students SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS student_id ON students TYPE int;
        DEFINE FIELD IF NOT EXISTS full_name ON students TYPE string;
        DEFINE FIELD IF NOT EXISTS email ON students TYPE string;
        DEFINE FIELD IF NOT EXISTS gpa ON students TYPE number;
        DEFINE INDEX IF NOT EXISTS idx_student_id ON students FIELDS student_id UNIQUE;
    "#;

    apply(db, "students", sql).await
}

/// Initialize `courses` table
///
/// Schema:
/// ```text
/// TABLE courses {
///   course_id:    INT (unique)
///   course_name:  STRING
///   min_gpa:      NUMBER
/// }
/// ```
async fn init_courses_table(db: &Surreal<Any>) -> Result<()> {
    let sql = r#"
        DEFINE TABLE IF NOT EXISTS courses SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS course_id ON courses TYPE int;
        DEFINE FIELD IF NOT EXISTS course_name ON courses TYPE string;
        DEFINE FIELD IF NOT EXISTS min_gpa ON courses TYPE number;
        DEFINE INDEX IF NOT EXISTS idx_course_id ON courses FIELDS course_id UNIQUE;
    "#;

    apply(db, "courses", sql).await
}

/// Initialize `enrollments` table
///
/// Schema:
/// ```text
/// TABLE enrollments {
///   enrollment_id:  INT (unique, from sequences:enrollments)
///   student_id:     INT (references students.student_id)
///   course_id:      INT (references courses.course_id)
///   registered_at:  DATETIME
/// }
/// ```
///
/// Constraints:
/// - `enrollment_id` is unique
/// - references are checked inside the registration transaction
/// - (student_id, course_id) is indexed but NOT unique: duplicates are allowed
/// - rows are never updated
async fn init_enrollments_table(db: &Surreal<Any>) -> Result<()> {
    let sql = r#"
        DEFINE TABLE IF NOT EXISTS enrollments SCHEMAFULL
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update NONE
                FOR delete NONE;
        DEFINE FIELD IF NOT EXISTS enrollment_id ON enrollments TYPE int ASSERT $value > 0;
        DEFINE FIELD IF NOT EXISTS student_id ON enrollments TYPE int;
        DEFINE FIELD IF NOT EXISTS course_id ON enrollments TYPE int;
        DEFINE FIELD IF NOT EXISTS registered_at ON enrollments TYPE datetime;
        DEFINE INDEX IF NOT EXISTS idx_enrollment_id ON enrollments FIELDS enrollment_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_enrollment_student ON enrollments FIELDS student_id;
        DEFINE INDEX IF NOT EXISTS idx_enrollment_course ON enrollments FIELDS course_id;
        DEFINE INDEX IF NOT EXISTS idx_enrollment_pair ON enrollments FIELDS student_id, course_id;
    "#;

    apply(db, "enrollments", sql).await
}

/// Initialize `sequences` table
///
/// One record per generated identifier space; `sequences:enrollments.value`
/// holds the last enrollment id issued.
async fn init_sequences_table(db: &Surreal<Any>) -> Result<()> {
    let sql = r#"
        DEFINE TABLE IF NOT EXISTS sequences SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS value ON sequences TYPE int DEFAULT 0;
    "#;

    apply(db, "sequences", sql).await
}
