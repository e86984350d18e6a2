//! Entity-type dispatch for the generic update and delete entry points the
//! menu calls.

use rusqlite::Connection;
use tracing::debug;

use super::students::{delete_student, update_student};
use super::teachers::{delete_teacher, update_teacher};
use crate::error::Result;
use crate::models::{Deleted, EntityKind, RecordUpdate, Updated};

pub fn update_record(conn: &mut Connection, id: i64, update: &RecordUpdate) -> Result<Updated> {
    debug!(kind = %update.kind(), id, "update requested");
    match update {
        RecordUpdate::Student(changes) => update_student(conn, id, changes),
        RecordUpdate::Teacher(changes) => update_teacher(conn, id, changes),
    }
}

pub fn delete_record(conn: &mut Connection, kind: EntityKind, id: i64) -> Result<Deleted> {
    debug!(%kind, id, "delete requested");
    match kind {
        EntityKind::Student => delete_student(conn, id),
        EntityKind::Teacher => delete_teacher(conn, id),
    }
}
