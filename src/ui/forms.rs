use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{capitalize, EntityKind, StudentChanges, TeacherChanges};

/// The entries of the main menu, in display order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum MenuAction {
    InsertStudent,
    InsertTeacher,
    UpdateStudent,
    UpdateTeacher,
    DeleteStudent,
    DeleteTeacher,
    EnrollStudent,
    Quit,
}

impl MenuAction {
    pub(crate) const ALL: [MenuAction; 8] = [
        MenuAction::InsertStudent,
        MenuAction::InsertTeacher,
        MenuAction::UpdateStudent,
        MenuAction::UpdateTeacher,
        MenuAction::DeleteStudent,
        MenuAction::DeleteTeacher,
        MenuAction::EnrollStudent,
        MenuAction::Quit,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            MenuAction::InsertStudent => "Insert student",
            MenuAction::InsertTeacher => "Insert teacher",
            MenuAction::UpdateStudent => "Update a student",
            MenuAction::UpdateTeacher => "Update a teacher",
            MenuAction::DeleteStudent => "Delete a student",
            MenuAction::DeleteTeacher => "Delete a teacher",
            MenuAction::EnrollStudent => "Enroll a student",
            MenuAction::Quit => "Quit",
        }
    }

    /// Digit shortcut, `'1'` for the first entry.
    pub(crate) fn shortcut(self) -> char {
        let position = Self::ALL
            .iter()
            .position(|action| *action == self)
            .unwrap_or(0);
        char::from(b'1' + position as u8)
    }

    pub(crate) fn from_shortcut(ch: char) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.shortcut() == ch)
    }
}

/// A fully parsed request, ready for the records store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    InsertStudent { name: String, age: i64, grade: i64 },
    InsertTeacher { name: String, subject: String },
    UpdateStudent { id: i64, changes: StudentChanges },
    UpdateTeacher { id: i64, changes: TeacherChanges },
    Delete { kind: EntityKind, id: i64 },
    Enroll { student_id: i64, subject: String },
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum FieldInput {
    Text,
    Number,
}

/// One labelled input line inside a form.
#[derive(Clone)]
pub(crate) struct FormField {
    label: &'static str,
    value: String,
    input: FieldInput,
    required: bool,
}

impl FormField {
    fn text(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            input: FieldInput::Text,
            required: true,
        }
    }

    fn number(label: &'static str) -> Self {
        Self {
            input: FieldInput::Number,
            ..Self::text(label)
        }
    }

    /// Blank means "leave unchanged" on update forms.
    fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn push_char(&mut self, ch: char) -> bool {
        let accepted = match self.input {
            FieldInput::Number => ch.is_ascii_digit(),
            FieldInput::Text => !ch.is_control(),
        };
        if accepted {
            self.value.push(ch);
        }
        accepted
    }

    fn trimmed(&self) -> Option<&str> {
        let trimmed = self.value.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    fn text_value(&self) -> Result<Option<String>> {
        match self.trimmed() {
            Some(value) => Ok(Some(value.to_string())),
            None if self.required => Err(anyhow!("{} is required.", self.label)),
            None => Ok(None),
        }
    }

    fn number_value(&self) -> Result<Option<i64>> {
        match self.trimmed() {
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| anyhow!("{} must be a whole number.", self.label)),
            None if self.required => Err(anyhow!("{} is required.", self.label)),
            None => Ok(None),
        }
    }

    fn prompt(&self) -> String {
        format!("{}: ", self.label)
    }
}

/// Unwrap a value the form marked as required.
fn required<T>(value: Option<T>, label: &str) -> Result<T> {
    value.ok_or_else(|| anyhow!("{label} is required."))
}

/// State of the modal form opened for a menu action.
#[derive(Clone)]
pub(crate) struct ActionForm {
    pub(crate) action: MenuAction,
    fields: Vec<FormField>,
    active: usize,
    pub(crate) error: Option<String>,
}

impl ActionForm {
    /// Build the form for `action`; `Quit` has none.
    pub(crate) fn for_action(action: MenuAction) -> Option<Self> {
        let fields = match action {
            MenuAction::InsertStudent => vec![
                FormField::text("Name"),
                FormField::number("Age"),
                FormField::number("Grade"),
            ],
            MenuAction::InsertTeacher => {
                vec![FormField::text("Name"), FormField::text("Subject")]
            }
            MenuAction::UpdateStudent => vec![
                FormField::number("Student ID"),
                FormField::text("New name").optional(),
                FormField::number("New age").optional(),
                FormField::number("New grade").optional(),
            ],
            MenuAction::UpdateTeacher => vec![
                FormField::number("Teacher ID"),
                FormField::text("New name").optional(),
                FormField::text("New subject").optional(),
            ],
            MenuAction::DeleteStudent => vec![FormField::number("Student ID")],
            MenuAction::DeleteTeacher => vec![FormField::number("Teacher ID")],
            MenuAction::EnrollStudent => {
                vec![FormField::number("Student ID"), FormField::text("Subject")]
            }
            MenuAction::Quit => return None,
        };

        Some(Self {
            action,
            fields,
            active: 0,
            error: None,
        })
    }

    pub(crate) fn title(&self) -> &'static str {
        self.action.label()
    }

    pub(crate) fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub(crate) fn active_index(&self) -> usize {
        self.active
    }

    pub(crate) fn is_last_field(&self) -> bool {
        self.active + 1 == self.fields.len()
    }

    pub(crate) fn next_field(&mut self) {
        self.active = (self.active + 1) % self.fields.len();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = (self.active + self.fields.len() - 1) % self.fields.len();
    }

    /// Append a character to the active field, validating allowed input.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        self.fields[self.active].push_char(ch)
    }

    pub(crate) fn backspace(&mut self) {
        self.fields[self.active].value.pop();
    }

    /// Column offset of the cursor inside the active line.
    pub(crate) fn cursor_offset(&self) -> usize {
        let field = &self.fields[self.active];
        field.prompt().chars().count() + field.value.chars().count()
    }

    /// Validate the inputs and turn them into a store command. Names are
    /// capitalised the way the menu always stored them.
    pub(crate) fn parse_command(&self) -> Result<Command> {
        let f = &self.fields;
        let command = match self.action {
            MenuAction::InsertStudent => Command::InsertStudent {
                name: capitalize(&required(f[0].text_value()?, f[0].label)?),
                age: required(f[1].number_value()?, f[1].label)?,
                grade: required(f[2].number_value()?, f[2].label)?,
            },
            MenuAction::InsertTeacher => Command::InsertTeacher {
                name: capitalize(&required(f[0].text_value()?, f[0].label)?),
                subject: required(f[1].text_value()?, f[1].label)?,
            },
            MenuAction::UpdateStudent => Command::UpdateStudent {
                id: required(f[0].number_value()?, f[0].label)?,
                changes: StudentChanges {
                    name: f[1].text_value()?.map(|name| capitalize(&name)),
                    age: f[2].number_value()?,
                    grade: f[3].number_value()?,
                },
            },
            MenuAction::UpdateTeacher => Command::UpdateTeacher {
                id: required(f[0].number_value()?, f[0].label)?,
                changes: TeacherChanges {
                    name: f[1].text_value()?.map(|name| capitalize(&name)),
                    subject: f[2].text_value()?,
                },
            },
            MenuAction::DeleteStudent => Command::Delete {
                kind: EntityKind::Student,
                id: required(f[0].number_value()?, f[0].label)?,
            },
            MenuAction::DeleteTeacher => Command::Delete {
                kind: EntityKind::Teacher,
                id: required(f[0].number_value()?, f[0].label)?,
            },
            MenuAction::EnrollStudent => Command::Enroll {
                student_id: required(f[0].number_value()?, f[0].label)?,
                subject: required(f[1].text_value()?, f[1].label)?,
            },
            MenuAction::Quit => return Err(anyhow!("Quit has no form.")),
        };
        Ok(command)
    }

    /// Render one field line for the form widget.
    pub(crate) fn build_line(&self, index: usize) -> Line<'static> {
        let field = &self.fields[index];
        let is_active = index == self.active;

        let display = if field.value.is_empty() {
            if field.required {
                "<required>".to_string()
            } else {
                "<unchanged>".to_string()
            }
        } else {
            field.value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if field.value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![Span::raw(field.prompt()), Span::styled(display, style)])
    }
}
