//! Domain models that mirror the SQLite schema. These stay light-weight data
//! holders; the persistence layer owns the invariants and the TUI owns the
//! presentation.

use std::fmt;
use std::str::FromStr;

use crate::error::RecordsError;

/// A student row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    /// Primary key assigned by SQLite.
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub grade: i64,
}

/// A teacher row. `subject` always matches the subject of the class the
/// teacher leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    pub subject: String,
}

/// The single teaching unit for a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    /// Canonical subject, also the primary key.
    pub subject: String,
    pub teacher_id: i64,
}

/// Join row asserting that a student participates in a subject's class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub student_id: i64,
    pub subject: String,
}

/// The two entity types callers may update or delete directly. Classes and
/// enrollments only change as a side effect of teacher and student writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Student,
    Teacher,
}

impl EntityKind {
    /// Capitalised label used at the start of status messages.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Student => "Student",
            EntityKind::Teacher => "Teacher",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Student => write!(f, "student"),
            EntityKind::Teacher => write!(f, "teacher"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = RecordsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(EntityKind::Student),
            "teacher" => Ok(EntityKind::Teacher),
            _ => Err(RecordsError::InvalidArgument(
                "Invalid entity type. Use 'student' or 'teacher'.".to_string(),
            )),
        }
    }
}

/// Fields a caller wants to change on a student. `None` leaves the stored
/// value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentChanges {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub grade: Option<i64>,
}

impl StudentChanges {
    /// Build a change set from sentinel-style inputs: an empty name or a
    /// numeric value of `-1` means "leave unchanged".
    pub fn from_sentinels(name: &str, age: i64, grade: i64) -> Self {
        Self {
            name: (!name.is_empty()).then(|| name.to_string()),
            age: (age != UNSET_NUMBER).then_some(age),
            grade: (grade != UNSET_NUMBER).then_some(grade),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.grade.is_none()
    }
}

/// Fields a caller wants to change on a teacher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeacherChanges {
    pub name: Option<String>,
    pub subject: Option<String>,
}

impl TeacherChanges {
    /// Sentinel counterpart of [`StudentChanges::from_sentinels`]; empty
    /// strings are skipped.
    pub fn from_sentinels(name: &str, subject: &str) -> Self {
        Self {
            name: (!name.is_empty()).then(|| name.to_string()),
            subject: (!subject.is_empty()).then(|| subject.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.subject.is_none()
    }
}

/// Numeric "unset" marker understood by the sentinel constructors. Valid ages
/// and grades are never negative.
pub const UNSET_NUMBER: i64 = -1;

/// A typed update request for [`crate::db::update_record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordUpdate {
    Student(StudentChanges),
    Teacher(TeacherChanges),
}

impl RecordUpdate {
    pub fn kind(&self) -> EntityKind {
        match self {
            RecordUpdate::Student(_) => EntityKind::Student,
            RecordUpdate::Teacher(_) => EntityKind::Teacher,
        }
    }
}

/// Result of an insert that skips duplicates by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome<T> {
    Created(T),
    /// A row with the same name already existed; nothing was written.
    DuplicateSkipped { name: String },
}

impl<T> InsertOutcome<T> {
    pub fn created(&self) -> Option<&T> {
        match self {
            InsertOutcome::Created(row) => Some(row),
            InsertOutcome::DuplicateSkipped { .. } => None,
        }
    }
}

impl fmt::Display for InsertOutcome<Student> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertOutcome::Created(student) => write!(
                f,
                "Student '{}' added with ID {}.",
                student.name, student.id
            ),
            InsertOutcome::DuplicateSkipped { name } => {
                write!(f, "Student '{name}' already exists; nothing added.")
            }
        }
    }
}

impl fmt::Display for InsertOutcome<Teacher> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertOutcome::Created(teacher) => write!(
                f,
                "Teacher '{}' added with ID {} and now leads '{}'.",
                teacher.name, teacher.id, teacher.subject
            ),
            InsertOutcome::DuplicateSkipped { name } => {
                write!(f, "Teacher '{name}' already exists; nothing added.")
            }
        }
    }
}

/// Result of a successful enrollment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollOutcome {
    Enrolled(Enrollment),
    AlreadyEnrolled(Enrollment),
}

impl fmt::Display for EnrollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrollOutcome::Enrolled(e) => write!(
                f,
                "Student with ID {} enrolled successfully in the class '{}'.",
                e.student_id, e.subject
            ),
            EnrollOutcome::AlreadyEnrolled(e) => write!(
                f,
                "Student with ID {} is already enrolled in the class '{}'.",
                e.student_id, e.subject
            ),
        }
    }
}

/// Confirmation of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Updated {
    pub kind: EntityKind,
    pub id: i64,
}

impl fmt::Display for Updated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} with ID {} updated successfully.", self.kind.label(), self.id)
    }
}

/// Confirmation of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deleted {
    pub kind: EntityKind,
    pub id: i64,
}

impl fmt::Display for Deleted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} with ID {} deleted successfully.", self.kind.label(), self.id)
    }
}

/// Canonical spelling of a subject: trimmed, first letter upper-case, the rest
/// lower-case. Returns `None` for a blank subject. Canonicalising an already
/// canonical subject returns it unchanged.
pub fn canonical_subject(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(capitalize(trimmed))
    }
}

/// Lower-case everything, then upper-case the first character. A first
/// character whose upper-case form is several characters ("ß", "ﬁ") stays
/// lower-case, otherwise a second pass would spell it differently.
pub fn capitalize(raw: &str) -> String {
    let mut lower = raw.chars().flat_map(char::to_lowercase);
    match lower.next() {
        Some(first) => {
            let mut upper = first.to_uppercase();
            let head = match (upper.next(), upper.next()) {
                (Some(single), None) => single,
                _ => first,
            };
            std::iter::once(head).chain(lower).collect()
        }
        None => String::new(),
    }
}
