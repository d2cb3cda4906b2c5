use chrono::{DateTime, NaiveDate, Utc};
use derivative::Derivative;
use log::error;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::app::error::TodoError;
use crate::app::models::{CreateTodoInput, Priority, Todo, UpdateTodoInput};
use crate::app::procedures::TodoProcedures;
use crate::app::todo_list::TodoList;

pub const DATE_FORMAT: &str = "%d.%m.%Y";

// Rows of the dialog, top to bottom
const TITLE: usize = 0;
const DESCRIPTION: usize = 1;
const DUE_DATE: usize = 2;
const PRIORITY: usize = 3;
const FIELD_COUNT: usize = 4;

// State of the add/edit dialog
#[derive(Derivative)]
#[derivative(Default)]
pub struct TodoEditDialogState {
    pub dialog_active: bool,
    todo_id: Option<i64>,
    content: TodoEditDialogContent,
    error_message: Option<String>,
    // (char index, row)
    cursor_position: (usize, usize),
}

// What the user typed so far
#[derive(Clone, Debug, Derivative, PartialEq)]
#[derivative(Default)]
struct TodoEditDialogContent {
    title: String,
    description: String,
    due_date: String,
    #[derivative(Default(value = "Priority::Medium"))]
    priority: Priority,
}

impl TodoEditDialogContent {
    fn text(&self, row: usize) -> String {
        match row {
            TITLE => self.title.clone(),
            DESCRIPTION => self.description.clone(),
            DUE_DATE => self.due_date.clone(),
            PRIORITY => self.priority.to_string(),
            _ => String::new(),
        }
    }

    fn text_mut(&mut self, row: usize) -> Option<&mut String> {
        match row {
            TITLE => Some(&mut self.title),
            DESCRIPTION => Some(&mut self.description),
            DUE_DATE => Some(&mut self.due_date),
            _ => None,
        }
    }

    // Empty text fields become explicit nulls
    fn description(&self) -> Option<String> {
        let description = self.description.trim();
        (!description.is_empty()).then(|| description.to_string())
    }

    fn due_date(&self) -> Result<Option<DateTime<Utc>>, TodoError> {
        let due_date = self.due_date.trim();
        if due_date.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(due_date, DATE_FORMAT)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|date| Some(date.and_utc()))
            .ok_or_else(|| TodoError::validation("Date should be in format dd.mm.yyyy"))
    }
}

fn char_count(text: &str) -> usize {
    text.chars().count()
}

fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

impl TodoEditDialogState {
    // Opens the dialog for a brand new todo
    pub fn create_a_new_todo(&mut self) {
        *self = TodoEditDialogState {
            dialog_active: true,
            ..TodoEditDialogState::default()
        };
    }

    // Opens the dialog prefilled with an existing todo
    pub fn edit_todo(&mut self, todo: &Todo) {
        *self = TodoEditDialogState {
            dialog_active: true,
            todo_id: Some(todo.id),
            content: TodoEditDialogContent {
                title: todo.title.clone(),
                description: todo.description.clone().unwrap_or_default(),
                due_date: todo
                    .due_date
                    .map(|date| date.format(DATE_FORMAT).to_string())
                    .unwrap_or_default(),
                priority: todo.priority,
            },
            error_message: None,
            cursor_position: (char_count(&todo.title), TITLE),
        };
    }

    pub fn cancel(&mut self) {
        self.dialog_active = false;
        self.error_message = None;
    }

    fn row_len(&self, row: usize) -> usize {
        char_count(&self.content.text(row))
    }

    pub fn move_cursor_down(&mut self) {
        let (x, y) = self.cursor_position;
        let y = (y + 1).min(FIELD_COUNT - 1);
        self.cursor_position = (x.min(self.row_len(y)), y);
    }

    pub fn move_cursor_up(&mut self) {
        let (x, y) = self.cursor_position;
        let y = y.saturating_sub(1);
        self.cursor_position = (x.min(self.row_len(y)), y);
    }

    pub fn move_cursor_left(&mut self) {
        let (x, y) = self.cursor_position;
        self.cursor_position = (x.saturating_sub(1), y);
    }

    pub fn move_cursor_right(&mut self) {
        let (x, y) = self.cursor_position;
        self.cursor_position = ((x + 1).min(self.row_len(y)), y);
    }

    // Delete the char before the cursor
    pub fn delete_char(&mut self) {
        let (x, y) = self.cursor_position;
        if x == 0 {
            return;
        }
        if let Some(text) = self.content.text_mut(y) {
            let at = byte_index(text, x - 1);
            text.remove(at);
            self.move_cursor_left();
        }
    }

    // Insert a char at the cursor; the priority row only takes l, m or h
    pub fn input(&mut self, to_insert: char) {
        let (x, y) = self.cursor_position;
        if y == PRIORITY {
            if let Some(priority) = Priority::parse(&to_insert.to_string()) {
                self.content.priority = priority;
                self.cursor_position = (0, y);
            }
            return;
        }
        if let Some(text) = self.content.text_mut(y) {
            let at = byte_index(text, x);
            text.insert(at, to_insert);
            self.move_cursor_right();
        }
    }

    // Saves the todo through the procedures and patches the list on success
    pub fn save_todo(&mut self, api: &dyn TodoProcedures, list: &mut TodoList<'_>) {
        let result = self.build_input().and_then(|input| match input {
            DialogInput::Create(input) => api.create_todo(input).map(|todo| list.apply_created(todo)),
            DialogInput::Update(input) => api.update_todo(input).map(|todo| list.apply_updated(todo)),
        });

        match result {
            Ok(()) => {
                self.error_message = None;
                self.dialog_active = false;
            }
            Err(err) => {
                if !matches!(err, TodoError::Validation(_)) {
                    error!("Failed to save todo: {err}");
                }
                self.error_message = Some(err.to_string());
            }
        }
    }

    // Validate what was typed and turn it into a procedure input
    fn build_input(&self) -> Result<DialogInput, TodoError> {
        let content = &self.content;
        let due_date = content.due_date()?;

        match self.todo_id {
            None => Ok(DialogInput::Create(
                CreateTodoInput {
                    title: content.title.clone(),
                    description: content.description(),
                    priority: content.priority,
                    due_date,
                }
                .validate()?,
            )),
            Some(id) => Ok(DialogInput::Update(
                UpdateTodoInput {
                    id,
                    title: Some(content.title.clone()),
                    description: Some(content.description()),
                    completed: None,
                    priority: Some(content.priority),
                    due_date: Some(due_date),
                }
                .validate()?,
            )),
        }
    }
}

#[derive(Debug, PartialEq)]
enum DialogInput {
    Create(CreateTodoInput),
    Update(UpdateTodoInput),
}

// Returns the UI content for the todo edit dialog
pub fn get_todo_edit_ui(state: &TodoEditDialogState) -> Vec<Line<'static>> {
    const GRAY_TEXT: Style = Style::new().fg(Color::Rgb(62, 62, 62));
    const WHITE_TEXT: Style = Style::new().fg(Color::White);
    const BLACK_ON_WHITE: Style = Style::new().fg(Color::Black).bg(Color::White);

    let rows = [
        ("Title:       ", "What needs to be done?"),
        ("Description: ", "Optional notes"),
        ("Due date:    ", "31.12.2024"),
        ("Priority:    ", "l / m / h"),
    ];
    let (cursor_x, cursor_y) = state.cursor_position;
    let mut text = Vec::new();

    for (row, (prefix, placeholder)) in rows.iter().enumerate() {
        let value = state.content.text(row);
        let mut spans = vec![Span::styled(prefix.to_string(), WHITE_TEXT)];
        let selected = row == cursor_y;

        if value.is_empty() {
            // Placeholder, with its first char highlighted when the row is selected
            if selected {
                spans.push(Span::styled(placeholder.chars().take(1).collect::<String>(), BLACK_ON_WHITE));
                spans.push(Span::styled(placeholder.chars().skip(1).collect::<String>(), GRAY_TEXT));
            } else {
                spans.push(Span::styled(placeholder.to_string(), GRAY_TEXT));
            }
        } else if selected {
            spans.push(Span::styled(value.chars().take(cursor_x).collect::<String>(), WHITE_TEXT));
            let under_cursor = value.chars().nth(cursor_x).map(String::from).unwrap_or_else(|| " ".to_string());
            spans.push(Span::styled(under_cursor, BLACK_ON_WHITE));
            spans.push(Span::styled(value.chars().skip(cursor_x + 1).collect::<String>(), WHITE_TEXT));
        } else {
            spans.push(Span::styled(value, WHITE_TEXT));
        }

        text.push(Line::from(spans));
    }

    text.push(Line::raw(""));

    if let Some(error_message) = &state.error_message {
        text.push(Line::from(Span::styled(
            error_message.clone(),
            Style::new().fg(Color::Red),
        )));
        text.push(Line::raw(""));
    }

    text.push(Line::from(Span::styled(
        "Enter - save, Esc - cancel",
        WHITE_TEXT,
    )));

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::GetTodoInput;
    use crate::app::procedures::TodoService;
    use crate::app::storage::Storage;
    use chrono::TimeZone;

    fn type_text(state: &mut TodoEditDialogState, text: &str) {
        for c in text.chars() {
            state.input(c);
        }
    }

    fn clear_row(state: &mut TodoEditDialogState) {
        state.cursor_position.0 = state.row_len(state.cursor_position.1);
        while state.cursor_position.0 > 0 {
            state.delete_char();
        }
    }

    #[test]
    fn new_todo_is_created_and_put_first() {
        let service = TodoService::new(Storage::open_in_memory().unwrap());
        let mut list = TodoList::with_items_from_api(&service);
        let mut dialog = TodoEditDialogState::default();

        dialog.create_a_new_todo();
        type_text(&mut dialog, "Buy milk");
        dialog.move_cursor_down();
        dialog.move_cursor_down();
        type_text(&mut dialog, "31.12.2024");
        dialog.move_cursor_down();
        dialog.input('h');
        dialog.save_todo(&service, &mut list);

        assert!(!dialog.dialog_active);
        let todo = &list.items[0];
        assert_eq!(todo.title, "Buy milk");
        assert_eq!(todo.description, None);
        assert_eq!(todo.priority, Priority::High);
        assert_eq!(todo.due_date, Some(Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap()));
    }

    #[test]
    fn empty_title_keeps_the_dialog_open() {
        let service = TodoService::new(Storage::open_in_memory().unwrap());
        let mut list = TodoList::with_items_from_api(&service);
        let mut dialog = TodoEditDialogState::default();

        dialog.create_a_new_todo();
        dialog.save_todo(&service, &mut list);

        assert!(dialog.dialog_active);
        assert_eq!(dialog.error_message.as_deref(), Some("Title is required"));
        assert!(list.items.is_empty());
    }

    #[test]
    fn bad_date_is_rejected() {
        let mut dialog = TodoEditDialogState::default();
        dialog.create_a_new_todo();
        type_text(&mut dialog, "Pay rent");
        dialog.move_cursor_down();
        dialog.move_cursor_down();
        type_text(&mut dialog, "2024-12-31");

        let err = dialog.build_input().unwrap_err();
        assert_eq!(err.to_string(), "Date should be in format dd.mm.yyyy");
    }

    #[test]
    fn clearing_description_sends_null() {
        let service = TodoService::new(Storage::open_in_memory().unwrap());
        let created = service
            .create_todo(CreateTodoInput {
                title: "Call mom".to_string(),
                description: Some("weekend".to_string()),
                ..CreateTodoInput::default()
            })
            .unwrap();
        let mut list = TodoList::with_items_from_api(&service);
        let mut dialog = TodoEditDialogState::default();

        dialog.edit_todo(&created);
        dialog.move_cursor_down();
        clear_row(&mut dialog);
        assert_eq!(
            dialog.build_input().unwrap(),
            DialogInput::Update(UpdateTodoInput {
                title: Some("Call mom".to_string()),
                description: Some(None),
                priority: Some(Priority::Medium),
                due_date: Some(None),
                ..UpdateTodoInput::new(created.id)
            })
        );

        dialog.save_todo(&service, &mut list);
        let stored = service.get_todo(GetTodoInput { id: created.id }).unwrap().unwrap();
        assert_eq!(stored.description, None);
        assert_eq!(list.items, vec![stored]);
    }

    #[test]
    fn cursor_handles_multibyte_text() {
        let mut dialog = TodoEditDialogState::default();
        dialog.create_a_new_todo();
        type_text(&mut dialog, "Café");
        dialog.move_cursor_left();
        dialog.delete_char();
        dialog.input('f');

        assert_eq!(dialog.content.title, "Café");
        assert_eq!(dialog.cursor_position, (3, TITLE));
    }

    #[test]
    fn cursor_stays_inside_the_dialog() {
        let mut dialog = TodoEditDialogState::default();
        dialog.create_a_new_todo();
        for _ in 0..10 {
            dialog.move_cursor_down();
        }
        assert_eq!(dialog.cursor_position.1, PRIORITY);
        for _ in 0..10 {
            dialog.move_cursor_up();
        }
        assert_eq!(dialog.cursor_position, (0, TITLE));
    }
}
