use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info};

use super::checks::{require_name, require_non_negative};
use crate::error::{RecordsError, Result};
use crate::models::{Deleted, EntityKind, InsertOutcome, Student, StudentChanges, Updated};

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        grade: row.get(3)?,
    })
}

/// Add a student unless one with the exact same name already exists. The
/// name check and the insert share one write transaction.
pub fn insert_student(
    conn: &mut Connection,
    name: &str,
    age: i64,
    grade: i64,
) -> Result<InsertOutcome<Student>> {
    let name = require_name("Student", name)?;
    let age = require_non_negative("Age", age)?;
    let grade = require_non_negative("Grade", grade)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if find_student_by_name(&tx, name)?.is_some() {
        debug!(name, "student already exists, skipping insert");
        return Ok(InsertOutcome::DuplicateSkipped {
            name: name.to_string(),
        });
    }

    tx.execute(
        "INSERT INTO students (name, age, grade) VALUES (?1, ?2, ?3)",
        params![name, age, grade],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;

    info!(student_id = id, name, "student inserted");
    Ok(InsertOutcome::Created(Student {
        id,
        name: name.to_string(),
        age,
        grade,
    }))
}

pub fn find_student(conn: &Connection, id: i64) -> Result<Option<Student>> {
    let student = conn
        .query_row(
            "SELECT id, name, age, grade FROM students WHERE id = ?1",
            [id],
            student_from_row,
        )
        .optional()?;
    Ok(student)
}

/// First student with this exact name, by id.
pub fn find_student_by_name(conn: &Connection, name: &str) -> Result<Option<Student>> {
    let student = conn
        .query_row(
            "SELECT id, name, age, grade FROM students WHERE name = ?1 ORDER BY id LIMIT 1",
            [name],
            student_from_row,
        )
        .optional()?;
    Ok(student)
}

/// Every student ordered by id, for the roster panel.
pub fn list_students(conn: &Connection) -> Result<Vec<Student>> {
    let mut stmt = conn.prepare("SELECT id, name, age, grade FROM students ORDER BY id")?;
    let students = stmt
        .query_map([], student_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(students)
}

/// Apply the supplied fields to an existing student and commit once.
pub fn update_student(conn: &mut Connection, id: i64, changes: &StudentChanges) -> Result<Updated> {
    let name = changes
        .name
        .as_deref()
        .map(|name| require_name("Student", name))
        .transpose()?;
    let age = changes
        .age
        .map(|age| require_non_negative("Age", age))
        .transpose()?;
    let grade = changes
        .grade
        .map(|grade| require_non_negative("Grade", grade))
        .transpose()?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut student = find_student(&tx, id)?.ok_or(RecordsError::StudentNotFound(id))?;

    if let Some(name) = name {
        student.name = name.to_string();
    }
    if let Some(age) = age {
        student.age = age;
    }
    if let Some(grade) = grade {
        student.grade = grade;
    }

    tx.execute(
        "UPDATE students SET name = ?1, age = ?2, grade = ?3 WHERE id = ?4",
        params![student.name, student.age, student.grade, id],
    )?;
    tx.commit()?;

    info!(student_id = id, "student updated");
    Ok(Updated {
        kind: EntityKind::Student,
        id,
    })
}

/// Remove a student. Their enrollments go with them through the cascading
/// foreign key.
pub fn delete_student(conn: &mut Connection, id: i64) -> Result<Deleted> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let deleted = tx.execute("DELETE FROM students WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(RecordsError::StudentNotFound(id));
    }
    tx.commit()?;

    info!(student_id = id, "student deleted");
    Ok(Deleted {
        kind: EntityKind::Student,
        id,
    })
}
