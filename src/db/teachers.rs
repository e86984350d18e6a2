use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info, warn};

use super::checks::{require_name, require_subject};
use crate::error::{is_primary_key_violation, RecordsError, Result};
use crate::models::{
    canonical_subject, Class, Deleted, EntityKind, InsertOutcome, Teacher, TeacherChanges, Updated,
};

fn teacher_from_row(row: &Row<'_>) -> rusqlite::Result<Teacher> {
    Ok(Teacher {
        id: row.get(0)?,
        name: row.get(1)?,
        subject: row.get(2)?,
    })
}

/// Add a teacher together with the class for their subject. Both rows are
/// written in a single transaction; a subject that already has a class aborts
/// the whole insert.
pub fn insert_teacher(
    conn: &mut Connection,
    name: &str,
    subject: &str,
) -> Result<InsertOutcome<Teacher>> {
    let name = require_name("Teacher", name)?;
    let subject = require_subject(subject)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if find_teacher_by_name(&tx, name)?.is_some() {
        debug!(name, "teacher already exists, skipping insert");
        return Ok(InsertOutcome::DuplicateSkipped {
            name: name.to_string(),
        });
    }

    if let Some(class) = find_class(&tx, &subject)? {
        warn!(subject = %class.subject, owner = class.teacher_id, "subject already has a class");
        return Err(RecordsError::SubjectTaken(class.subject));
    }

    tx.execute(
        "INSERT INTO teachers (name, subject) VALUES (?1, ?2)",
        params![name, subject],
    )?;
    let id = tx.last_insert_rowid();

    tx.execute(
        "INSERT INTO classes (subject, teacher_id) VALUES (?1, ?2)",
        params![subject, id],
    )
    .map_err(|err| subject_conflict(err, &subject))?;
    tx.commit()?;

    info!(teacher_id = id, name, subject = %subject, "teacher and class inserted");
    Ok(InsertOutcome::Created(Teacher {
        id,
        name: name.to_string(),
        subject,
    }))
}

pub fn find_teacher(conn: &Connection, id: i64) -> Result<Option<Teacher>> {
    let teacher = conn
        .query_row(
            "SELECT id, name, subject FROM teachers WHERE id = ?1",
            [id],
            teacher_from_row,
        )
        .optional()?;
    Ok(teacher)
}

pub fn find_teacher_by_name(conn: &Connection, name: &str) -> Result<Option<Teacher>> {
    let teacher = conn
        .query_row(
            "SELECT id, name, subject FROM teachers WHERE name = ?1 ORDER BY id LIMIT 1",
            [name],
            teacher_from_row,
        )
        .optional()?;
    Ok(teacher)
}

/// Every teacher ordered by id, for the roster panel.
pub fn list_teachers(conn: &Connection) -> Result<Vec<Teacher>> {
    let mut stmt = conn.prepare("SELECT id, name, subject FROM teachers ORDER BY id")?;
    let teachers = stmt
        .query_map([], teacher_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(teachers)
}

/// Look up a class by subject. The subject is canonicalised first, so any
/// casing of an existing subject finds it.
pub fn find_class(conn: &Connection, subject: &str) -> Result<Option<Class>> {
    let Some(subject) = canonical_subject(subject) else {
        return Ok(None);
    };
    let class = conn
        .query_row(
            "SELECT subject, teacher_id FROM classes WHERE subject = ?1",
            [subject],
            |row| {
                Ok(Class {
                    subject: row.get(0)?,
                    teacher_id: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(class)
}

/// The class key is the last word on subject ownership: a write that trips it
/// is the same conflict the lookup above reports.
fn subject_conflict(err: rusqlite::Error, subject: &str) -> RecordsError {
    if is_primary_key_violation(&err) {
        warn!(subject, "class key rejected the subject");
        RecordsError::SubjectTaken(subject.to_string())
    } else {
        err.into()
    }
}

/// Apply the supplied fields to a teacher. A subject change moves the
/// teacher's class, and through the cascading key its enrollments, to the new
/// subject.
pub fn update_teacher(conn: &mut Connection, id: i64, changes: &TeacherChanges) -> Result<Updated> {
    let name = changes
        .name
        .as_deref()
        .map(|name| require_name("Teacher", name))
        .transpose()?;
    let subject = changes.subject.as_deref().map(require_subject).transpose()?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut teacher = find_teacher(&tx, id)?.ok_or(RecordsError::TeacherNotFound(id))?;

    if let Some(name) = name {
        teacher.name = name.to_string();
    }

    if let Some(subject) = subject.filter(|subject| *subject != teacher.subject) {
        if let Some(class) = find_class(&tx, &subject)? {
            if class.teacher_id != id {
                warn!(teacher_id = id, subject = %subject, "subject already has a class");
                return Err(RecordsError::SubjectTaken(subject));
            }
        }
        tx.execute(
            "UPDATE classes SET subject = ?1 WHERE teacher_id = ?2",
            params![subject, id],
        )
        .map_err(|err| subject_conflict(err, &subject))?;
        teacher.subject = subject;
    }

    tx.execute(
        "UPDATE teachers SET name = ?1, subject = ?2 WHERE id = ?3",
        params![teacher.name, teacher.subject, id],
    )?;
    tx.commit()?;

    info!(teacher_id = id, subject = %teacher.subject, "teacher updated");
    Ok(Updated {
        kind: EntityKind::Teacher,
        id,
    })
}

/// Remove a teacher. The class they lead and its enrollments cascade away.
pub fn delete_teacher(conn: &mut Connection, id: i64) -> Result<Deleted> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let deleted = tx.execute("DELETE FROM teachers WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(RecordsError::TeacherNotFound(id));
    }
    tx.commit()?;

    info!(teacher_id = id, "teacher deleted");
    Ok(Deleted {
        kind: EntityKind::Teacher,
        id,
    })
}
