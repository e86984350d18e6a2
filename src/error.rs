//! Error type returned by the records store.
//!
//! Everything except [`RecordsError::Storage`] is a reportable condition: the
//! caller shows the message and keeps running. Storage failures bubble up to
//! the process boundary.

use rusqlite::ErrorCode;

/// Coarse classification of a [`RecordsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Conflict,
    Storage,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    #[error("Student with ID {0} not found.")]
    StudentNotFound(i64),

    #[error("Teacher with ID {0} not found.")]
    TeacherNotFound(i64),

    #[error("Class '{0}' not found.")]
    ClassNotFound(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Class '{0}' already has a teacher.")]
    SubjectTaken(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl RecordsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecordsError::StudentNotFound(_)
            | RecordsError::TeacherNotFound(_)
            | RecordsError::ClassNotFound(_) => ErrorKind::NotFound,
            RecordsError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            RecordsError::SubjectTaken(_) => ErrorKind::Conflict,
            RecordsError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Whether the caller should show this as a status message rather than
    /// abort.
    pub fn is_reportable(&self) -> bool {
        self.kind() != ErrorKind::Storage
    }
}

/// Result alias used throughout the persistence layer.
pub type Result<T> = std::result::Result<T, RecordsError>;

/// True when `err` is a primary-key violation, the authoritative duplicate
/// signal for composite-keyed tables.
pub(crate) fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_classify_variants() {
        assert_eq!(RecordsError::StudentNotFound(1).kind(), ErrorKind::NotFound);
        assert_eq!(
            RecordsError::ClassNotFound("Art".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            RecordsError::InvalidArgument("bad".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            RecordsError::SubjectTaken("Art".into()).kind(),
            ErrorKind::Conflict
        );
        assert!(!RecordsError::Storage(rusqlite::Error::InvalidQuery).is_reportable());
        assert!(RecordsError::TeacherNotFound(2).is_reportable());
    }

    #[test]
    fn not_found_messages_match_menu_wording() {
        assert_eq!(
            RecordsError::TeacherNotFound(7).to_string(),
            "Teacher with ID 7 not found."
        );
    }
}
