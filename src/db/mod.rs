//! Persistence module split across logical submodules. Every operation takes
//! the connection explicitly; every write takes `&mut Connection` so it can
//! hold an immediate transaction.

mod checks;
mod connection;
mod enrollments;
mod records;
mod students;
mod teachers;

pub use connection::{ensure_schema, open_in_memory, open_store};
pub use enrollments::{enroll_student, enrollments_for_student, enrollments_for_subject};
#[cfg(test)]
pub(crate) use enrollments::find_enrollment;
pub use records::{delete_record, update_record};
pub use students::{
    delete_student, find_student, find_student_by_name, insert_student, list_students,
    update_student,
};
pub use teachers::{
    delete_teacher, find_class, find_teacher, find_teacher_by_name, insert_teacher,
    list_teachers, update_teacher,
};
