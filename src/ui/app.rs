use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;

use crate::db::{
    delete_record, enroll_student, enrollments_for_student, enrollments_for_subject,
    insert_student, insert_teacher, list_students, list_teachers, update_record,
};
use crate::error::RecordsError;
use crate::models::{RecordUpdate, Student, Teacher};

use super::forms::{ActionForm, Command, MenuAction};
use super::helpers::{centered_rect, surface_error};

/// Height of the title bar.
const HEADER_HEIGHT: u16 = 3;
/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;

/// Either browsing the menu or filling in the form for one action.
enum Mode {
    Menu,
    Form(ActionForm),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Student plus the subjects they are enrolled in.
struct RosterStudent {
    student: Student,
    subjects: Vec<String>,
}

/// Teacher plus the number of students in their class.
struct RosterTeacher {
    teacher: Teacher,
    class_size: usize,
}

/// Read-only snapshot shown beside the menu so ids are easy to find.
struct Roster {
    students: Vec<RosterStudent>,
    teachers: Vec<RosterTeacher>,
}

impl Roster {
    fn load(conn: &Connection) -> Result<Self> {
        let students = list_students(conn)?
            .into_iter()
            .map(|student| -> Result<RosterStudent> {
                let subjects = enrollments_for_student(conn, student.id)?
                    .into_iter()
                    .map(|enrollment| enrollment.subject)
                    .collect();
                Ok(RosterStudent { student, subjects })
            })
            .collect::<Result<Vec<_>>>()?;
        let teachers = list_teachers(conn)?
            .into_iter()
            .map(|teacher| -> Result<RosterTeacher> {
                let class_size = enrollments_for_subject(conn, &teacher.subject)?.len();
                Ok(RosterTeacher {
                    teacher,
                    class_size,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { students, teachers })
    }
}

/// Central application state shared across the TUI.
pub struct App {
    conn: Connection,
    selected: usize,
    mode: Mode,
    status: Option<StatusMessage>,
    roster: Roster,
}

impl App {
    pub fn new(conn: Connection) -> Result<Self> {
        let roster = Roster::load(&conn)?;
        Ok(Self {
            conn,
            selected: 0,
            mode: Mode::Menu,
            status: None,
            roster,
        })
    }

    /// Process one key press. Returns `true` once the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Menu);

        self.mode = match mode {
            Mode::Menu => self.handle_menu_key(code, &mut exit),
            Mode::Form(form) => self.handle_form_key(code, form)?,
        };

        Ok(exit)
    }

    fn handle_menu_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        let count = MenuAction::ALL.len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
                Mode::Menu
            }
            KeyCode::Up => {
                self.selected = (self.selected + count - 1) % count;
                Mode::Menu
            }
            KeyCode::Down => {
                self.selected = (self.selected + 1) % count;
                Mode::Menu
            }
            KeyCode::Home => {
                self.selected = 0;
                Mode::Menu
            }
            KeyCode::End => {
                self.selected = count - 1;
                Mode::Menu
            }
            KeyCode::Enter => self.open_action(MenuAction::ALL[self.selected], exit),
            KeyCode::Char(ch) => match MenuAction::from_shortcut(ch) {
                Some(action) => {
                    self.selected = MenuAction::ALL
                        .iter()
                        .position(|candidate| *candidate == action)
                        .unwrap_or(self.selected);
                    self.open_action(action, exit)
                }
                None => {
                    self.set_status(
                        "Invalid choice. Please enter a number from 1 to 8.",
                        StatusKind::Error,
                    );
                    Mode::Menu
                }
            },
            _ => Mode::Menu,
        }
    }

    fn open_action(&mut self, action: MenuAction, exit: &mut bool) -> Mode {
        match ActionForm::for_action(action) {
            Some(form) => {
                self.clear_status();
                Mode::Form(form)
            }
            None => {
                *exit = true;
                Mode::Menu
            }
        }
    }

    fn handle_form_key(&mut self, code: KeyCode, mut form: ActionForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status(format!("{} cancelled.", form.title()), StatusKind::Info);
                return Ok(Mode::Menu);
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter if !form.is_last_field() => form.next_field(),
            KeyCode::Enter => match form.parse_command() {
                Ok(command) => {
                    self.execute(command)?;
                    return Ok(Mode::Menu);
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::Form(form))
    }

    /// Run a command against the store and report the outcome in the footer.
    /// Only storage failures escape as errors.
    fn execute(&mut self, command: Command) -> Result<()> {
        let outcome: Result<String, RecordsError> = match command {
            Command::InsertStudent { name, age, grade } => {
                insert_student(&mut self.conn, &name, age, grade).map(|o| o.to_string())
            }
            Command::InsertTeacher { name, subject } => {
                insert_teacher(&mut self.conn, &name, &subject).map(|o| o.to_string())
            }
            Command::UpdateStudent { id, changes } => {
                update_record(&mut self.conn, id, &RecordUpdate::Student(changes))
                    .map(|o| o.to_string())
            }
            Command::UpdateTeacher { id, changes } => {
                update_record(&mut self.conn, id, &RecordUpdate::Teacher(changes))
                    .map(|o| o.to_string())
            }
            Command::Delete { kind, id } => {
                delete_record(&mut self.conn, kind, id).map(|o| o.to_string())
            }
            Command::Enroll {
                student_id,
                subject,
            } => enroll_student(&mut self.conn, student_id, &subject).map(|o| o.to_string()),
        };

        match outcome {
            Ok(message) => self.set_status(message, StatusKind::Info),
            Err(err) if err.is_reportable() => self.set_status(err.to_string(), StatusKind::Error),
            Err(err) => return Err(err.into()),
        }

        self.roster = Roster::load(&self.conn)?;
        Ok(())
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_header(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(chunks[1]);
        self.draw_menu(frame, body[0]);
        self.draw_roster(frame, body[1]);

        self.draw_footer(frame, chunks[2]);

        if let Mode::Form(form) = &self.mode {
            self.draw_form(frame, area, form);
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let title = Paragraph::new(Line::from(Span::styled(
            "School Records Manager",
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, area);
    }

    fn draw_menu(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = MenuAction::ALL
            .iter()
            .map(|action| ListItem::new(format!("({}) {}", action.shortcut(), action.label())))
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Select an option").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("> ");

        let mut list_state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn draw_roster(&self, frame: &mut Frame, area: Rect) {
        let halves = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        let students: Vec<ListItem> = if self.roster.students.is_empty() {
            vec![ListItem::new(Span::styled(
                "No students yet.",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            self.roster
                .students
                .iter()
                .map(|entry| {
                    let s = &entry.student;
                    let mut spans = vec![Span::raw(format!(
                        "#{} {} (age {}, grade {})",
                        s.id, s.name, s.age, s.grade
                    ))];
                    if !entry.subjects.is_empty() {
                        spans.push(Span::styled(
                            format!("  [{}]", entry.subjects.join(", ")),
                            Style::default().fg(Color::Cyan),
                        ));
                    }
                    ListItem::new(Line::from(spans))
                })
                .collect()
        };
        frame.render_widget(
            List::new(students).block(Block::default().title("Students").borders(Borders::ALL)),
            halves[0],
        );

        let teachers: Vec<ListItem> = if self.roster.teachers.is_empty() {
            vec![ListItem::new(Span::styled(
                "No teachers yet.",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            self.roster
                .teachers
                .iter()
                .map(|entry| {
                    let t = &entry.teacher;
                    ListItem::new(format!(
                        "#{} {} teaches {} ({} enrolled)",
                        t.id, t.name, t.subject, entry.class_size
                    ))
                })
                .collect()
        };
        frame.render_widget(
            List::new(teachers).block(Block::default().title("Teachers").borders(Borders::ALL)),
            halves[1],
        );
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = match self.mode {
            Mode::Menu => "Up/Down to move • Enter or 1-8 to choose • q to quit",
            Mode::Form(_) => "Enter for next field/save • Tab to switch • Esc to cancel",
        };
        let instructions = Line::from(Span::styled(
            instructions,
            Style::default().fg(Color::Gray),
        ));

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, form: &ActionForm) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(form.title()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = (0..form.field_count())
            .map(|index| form.build_line(index))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else if matches!(
            form.action,
            MenuAction::UpdateStudent | MenuAction::UpdateTeacher
        ) {
            lines.push(Line::from(Span::styled(
                "Leave a field blank to keep its current value.",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x + form.cursor_offset() as u16;
        let cursor_y = inner.y + form.active_index() as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{find_class, find_enrollment, find_student_by_name, open_in_memory};

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    fn status(app: &App) -> Option<(String, StatusKind)> {
        app.status
            .as_ref()
            .map(|status| (status.text.clone(), status.kind))
    }

    #[test]
    fn menu_shortcuts_drive_inserts_and_enrollment() {
        let mut app = App::new(open_in_memory().unwrap()).unwrap();

        app.handle_key(KeyCode::Char('2')).unwrap();
        type_text(&mut app, "ada");
        app.handle_key(KeyCode::Enter).unwrap();
        type_text(&mut app, "math");
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(find_class(&app.conn, "Math").unwrap().is_some());
        assert_eq!(app.roster.teachers.len(), 1);

        app.handle_key(KeyCode::Char('1')).unwrap();
        type_text(&mut app, "sam");
        app.handle_key(KeyCode::Enter).unwrap();
        type_text(&mut app, "12");
        app.handle_key(KeyCode::Enter).unwrap();
        type_text(&mut app, "7");
        app.handle_key(KeyCode::Enter).unwrap();
        let sam = find_student_by_name(&app.conn, "Sam").unwrap().unwrap();

        app.handle_key(KeyCode::Char('7')).unwrap();
        type_text(&mut app, &sam.id.to_string());
        app.handle_key(KeyCode::Enter).unwrap();
        type_text(&mut app, "MATH");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(find_enrollment(&app.conn, sam.id, "Math").unwrap().is_some());
        let (text, kind) = status(&app).unwrap();
        assert_eq!(kind, StatusKind::Info);
        assert!(text.contains("enrolled successfully"));
        assert_eq!(app.roster.students[0].subjects, vec!["Math".to_string()]);
        assert_eq!(app.roster.teachers[0].class_size, 1);
    }

    #[test]
    fn not_found_is_reported_without_exiting() {
        let mut app = App::new(open_in_memory().unwrap()).unwrap();

        app.handle_key(KeyCode::Char('5')).unwrap();
        type_text(&mut app, "42");
        let exit = app.handle_key(KeyCode::Enter).unwrap();

        assert!(!exit);
        assert!(matches!(app.mode, Mode::Menu));
        assert_eq!(
            status(&app),
            Some((
                "Student with ID 42 not found.".to_string(),
                StatusKind::Error
            ))
        );
    }

    #[test]
    fn form_errors_keep_the_form_open() {
        let mut app = App::new(open_in_memory().unwrap()).unwrap();

        app.handle_key(KeyCode::Char('6')).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();

        match &app.mode {
            Mode::Form(form) => assert_eq!(form.error.as_deref(), Some("Teacher ID is required.")),
            Mode::Menu => panic!("form should stay open"),
        }

        app.handle_key(KeyCode::Esc).unwrap();
        assert!(matches!(app.mode, Mode::Menu));
    }

    #[test]
    fn oversized_id_shows_the_field_message() {
        let mut app = App::new(open_in_memory().unwrap()).unwrap();

        app.handle_key(KeyCode::Char('5')).unwrap();
        type_text(&mut app, "9999999999999999999999999");
        app.handle_key(KeyCode::Enter).unwrap();

        match &app.mode {
            Mode::Form(form) => assert_eq!(
                form.error.as_deref(),
                Some("Student ID must be a whole number.")
            ),
            Mode::Menu => panic!("form should stay open"),
        }
    }

    #[test]
    fn duplicate_sharp_s_subject_is_reported_without_exiting() {
        let mut app = App::new(open_in_memory().unwrap()).unwrap();

        for name in ["ada", "grace"] {
            app.handle_key(KeyCode::Char('2')).unwrap();
            type_text(&mut app, name);
            app.handle_key(KeyCode::Enter).unwrap();
            type_text(&mut app, "ßport");
            let exit = app.handle_key(KeyCode::Enter).unwrap();
            assert!(!exit);
        }

        let (text, kind) = status(&app).unwrap();
        assert_eq!(kind, StatusKind::Error);
        assert_eq!(text, "Class 'ßport' already has a teacher.");
        assert_eq!(app.roster.teachers.len(), 1);
    }

    #[test]
    fn quit_entry_and_q_key_exit() {
        let mut app = App::new(open_in_memory().unwrap()).unwrap();
        assert!(app.handle_key(KeyCode::Char('8')).unwrap());

        let mut app = App::new(open_in_memory().unwrap()).unwrap();
        app.handle_key(KeyCode::Up).unwrap();
        assert_eq!(MenuAction::ALL[app.selected], MenuAction::Quit);
        assert!(app.handle_key(KeyCode::Enter).unwrap());
    }

    #[test]
    fn unknown_menu_key_reports_invalid_choice() {
        let mut app = App::new(open_in_memory().unwrap()).unwrap();
        assert!(!app.handle_key(KeyCode::Char('x')).unwrap());
        let (text, kind) = status(&app).unwrap();
        assert_eq!(kind, StatusKind::Error);
        assert!(text.starts_with("Invalid choice"));
    }
}
