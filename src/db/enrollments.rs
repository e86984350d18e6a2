use rusqlite::{params, Connection, Row, TransactionBehavior};
use tracing::{debug, info};

use super::checks::require_subject;
use super::students::find_student;
use super::teachers::find_class;
use crate::error::{is_primary_key_violation, RecordsError, Result};
use crate::models::{canonical_subject, EnrollOutcome, Enrollment};

fn enrollment_from_row(row: &Row<'_>) -> rusqlite::Result<Enrollment> {
    Ok(Enrollment {
        student_id: row.get(0)?,
        subject: row.get(1)?,
    })
}

/// Enroll a student in the class for `subject`. The student and the class
/// must both exist. A repeat request is reported as already enrolled; the
/// composite primary key is what decides that.
pub fn enroll_student(conn: &mut Connection, student_id: i64, subject: &str) -> Result<EnrollOutcome> {
    let subject = require_subject(subject)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if find_student(&tx, student_id)?.is_none() {
        return Err(RecordsError::StudentNotFound(student_id));
    }
    if find_class(&tx, &subject)?.is_none() {
        return Err(RecordsError::ClassNotFound(subject));
    }

    let enrollment = Enrollment {
        student_id,
        subject,
    };

    let inserted = tx.execute(
        "INSERT INTO enrollments (student_id, subject) VALUES (?1, ?2)",
        params![enrollment.student_id, enrollment.subject],
    );
    match inserted {
        Ok(_) => {}
        Err(err) if is_primary_key_violation(&err) => {
            debug!(student_id, subject = %enrollment.subject, "student already enrolled");
            return Ok(EnrollOutcome::AlreadyEnrolled(enrollment));
        }
        Err(err) => return Err(err.into()),
    }
    tx.commit()?;

    info!(student_id, subject = %enrollment.subject, "student enrolled");
    Ok(EnrollOutcome::Enrolled(enrollment))
}

#[cfg(test)]
pub(crate) fn find_enrollment(
    conn: &Connection,
    student_id: i64,
    subject: &str,
) -> Result<Option<Enrollment>> {
    use rusqlite::OptionalExtension;

    let Some(subject) = canonical_subject(subject) else {
        return Ok(None);
    };
    let enrollment = conn
        .query_row(
            "SELECT student_id, subject FROM enrollments WHERE student_id = ?1 AND subject = ?2",
            params![student_id, subject],
            enrollment_from_row,
        )
        .optional()?;
    Ok(enrollment)
}

/// Subjects a student is enrolled in, alphabetically.
pub fn enrollments_for_student(conn: &Connection, student_id: i64) -> Result<Vec<Enrollment>> {
    let mut stmt = conn.prepare(
        "SELECT student_id, subject FROM enrollments WHERE student_id = ?1 ORDER BY subject",
    )?;
    let enrollments = stmt
        .query_map([student_id], enrollment_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(enrollments)
}

/// Students enrolled in a subject's class, by student id. The roster uses the
/// length as the class size.
pub fn enrollments_for_subject(conn: &Connection, subject: &str) -> Result<Vec<Enrollment>> {
    let Some(subject) = canonical_subject(subject) else {
        return Ok(Vec::new());
    };
    let mut stmt = conn.prepare(
        "SELECT student_id, subject FROM enrollments WHERE subject = ?1 ORDER BY student_id",
    )?;
    let enrollments = stmt
        .query_map([subject], enrollment_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(enrollments)
}
