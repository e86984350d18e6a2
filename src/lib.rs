//! Core library surface for the School Records Manager.
//!
//! The records store lives in [`db`]: every operation takes the SQLite
//! connection explicitly and enforces the uniqueness and referential rules
//! before it commits. The TUI in [`ui`] is a thin menu over those operations.
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod ui;

/// Convenience re-exports for the persistence layer.
pub use db::{
    delete_record, enroll_student, insert_student, insert_teacher, open_in_memory, open_store,
    update_record,
};

pub use config::{DatabaseTarget, StoreConfig};
pub use error::{ErrorKind, RecordsError};

/// The domain types other layers manipulate.
pub use models::{
    Class, EnrollOutcome, Enrollment, EntityKind, InsertOutcome, RecordUpdate, Student,
    StudentChanges, Teacher, TeacherChanges,
};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
