//! Ratatui front-end: the main menu of record operations, a modal form per
//! operation, and a roster panel listing the ids the forms ask for.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
