use chrono::{DateTime, Local, TimeZone};
use log::{error, info};
use now::DateTimeNow;
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::*;

use crate::app::error::TodoError;
use crate::app::models::{DeleteTodoInput, Priority, Todo, UpdateTodoInput};
use crate::app::procedures::TodoProcedures;
use crate::app::todo_edit::DATE_FORMAT;

// Possible todo list sorting orders
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SortedBy {
    ByDueDate,
    ByName,
    ByPriority,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    pub fn next(self) -> StatusFilter {
        match self {
            StatusFilter::All => StatusFilter::Active,
            StatusFilter::Active => StatusFilter::Completed,
            StatusFilter::Completed => StatusFilter::All,
        }
    }

    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !todo.completed,
            StatusFilter::Completed => todo.completed,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl PriorityFilter {
    // all -> low -> medium -> high -> all
    pub fn next(self) -> PriorityFilter {
        match self {
            PriorityFilter::All => PriorityFilter::Only(Priority::Low),
            PriorityFilter::Only(Priority::Low) => PriorityFilter::Only(Priority::Medium),
            PriorityFilter::Only(Priority::Medium) => PriorityFilter::Only(Priority::High),
            PriorityFilter::Only(Priority::High) => PriorityFilter::All,
        }
    }

    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            PriorityFilter::All => true,
            PriorityFilter::Only(priority) => todo.priority == priority,
        }
    }

    pub fn label(self) -> String {
        match self {
            PriorityFilter::All => "All Priorities".to_string(),
            PriorityFilter::Only(priority) => format!("{} Priority", capitalize(priority.as_str())),
        }
    }
}

/// A todo is overdue when it is still open and its due date lies before
/// the start of the current calendar day.
///
/// Due dates hold the calendar day the user typed as UTC midnight, so the
/// day is compared as a wall-clock date against `now`'s own calendar.
pub fn is_overdue_at<Tz: TimeZone>(todo: &Todo, now: &DateTime<Tz>) -> bool {
    match todo.due_date {
        Some(due_date) => {
            !todo.completed && due_date.naive_utc() < now.beginning_of_day().naive_local()
        }
        None => false,
    }
}

pub struct TodoList<'a> {
    pub state: ListState,
    pub items: Vec<Todo>,
    pub status_filter: StatusFilter,
    pub priority_filter: PriorityFilter,
    pub last_error: Option<String>,
    api: &'a dyn TodoProcedures,
    sorted_by: Option<SortedBy>,
    sort_descending: bool,
}

impl<'a> TodoList<'a> {
    // Initialize a todo list with every todo the server knows about
    pub fn with_items_from_api(api: &'a dyn TodoProcedures) -> TodoList<'a> {
        let mut list = TodoList {
            state: ListState::default(),
            items: Vec::new(),
            status_filter: StatusFilter::default(),
            priority_filter: PriorityFilter::default(),
            last_error: None,
            api,
            sorted_by: None,
            sort_descending: false,
        };
        list.reload();
        list
    }

    // Replace the local items with a fresh copy from the server
    pub fn reload(&mut self) {
        match self.api.get_todos() {
            Ok(todos) => {
                info!("loaded {} todos", todos.len());
                self.items = todos;
                self.sorted_by = None;
                self.sort_descending = false;
                self.last_error = None;
                self.clamp_selection();
            }
            Err(err) => self.report("Failed to load todos", err),
        }
    }

    fn report(&mut self, action: &str, err: TodoError) {
        error!("{action}: {err}");
        self.last_error = Some(format!("{action}: {err}"));
    }

    // Todos passing both filters, in display order
    pub fn visible(&self) -> Vec<&Todo> {
        self.items
            .iter()
            .filter(|todo| self.status_filter.matches(todo) && self.priority_filter.matches(todo))
            .collect()
    }

    // Move the selection to the next visible item
    pub fn next(&mut self) {
        let len = self.visible().len();
        let i = match self.state.selected() {
            Some(i) => {
                if len == 0 || i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    // Move the selection to the previous visible item
    pub fn previous(&mut self) {
        let len = self.visible().len();
        let i = match self.state.selected() {
            Some(i) => {
                if len == 0 {
                    0
                } else if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn unselect(&mut self) {
        self.state.select(None);
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        match self.state.selected() {
            Some(_) if len == 0 => self.state.select(None),
            Some(i) if i >= len => self.state.select(Some(len - 1)),
            _ => {}
        }
    }

    // Get the selected todo
    pub fn get_selected(&self) -> Option<&Todo> {
        self.state
            .selected()
            .and_then(|i| self.visible().get(i).copied())
    }

    pub fn cycle_status_filter(&mut self) {
        self.status_filter = self.status_filter.next();
        self.clamp_selection();
    }

    pub fn cycle_priority_filter(&mut self) {
        self.priority_filter = self.priority_filter.next();
        self.clamp_selection();
    }

    // Flip the completed flag on the server, then locally
    pub fn toggle_completed(&mut self) {
        let Some(todo) = self.get_selected() else {
            return;
        };
        let input = UpdateTodoInput {
            completed: Some(!todo.completed),
            ..UpdateTodoInput::new(todo.id)
        };
        match self.api.update_todo(input) {
            Ok(updated) => self.apply_updated(updated),
            Err(err) => self.report("Failed to toggle todo", err),
        }
    }

    // Delete the selected todo; the row disappears locally only if the call succeeded
    pub fn delete_selected(&mut self) {
        let Some(id) = self.get_selected().map(|todo| todo.id) else {
            return;
        };
        match self.api.delete_todo(DeleteTodoInput { id }) {
            Ok(_) => {
                self.items.retain(|todo| todo.id != id);
                self.last_error = None;
                self.clamp_selection();
            }
            Err(err) => self.report("Failed to delete todo", err),
        }
    }

    // Newest todos go first
    pub fn apply_created(&mut self, todo: Todo) {
        self.items.insert(0, todo);
        self.last_error = None;
    }

    pub fn apply_updated(&mut self, todo: Todo) {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == todo.id) {
            *item = todo;
        }
        self.last_error = None;
        self.clamp_selection();
    }

    pub fn count_completed(&self) -> usize {
        self.items.iter().filter(|todo| todo.completed).count()
    }

    pub fn count_active(&self) -> usize {
        self.items.iter().filter(|todo| !todo.completed).count()
    }

    pub fn count_overdue_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> usize {
        self.items
            .iter()
            .filter(|todo| is_overdue_at(todo, now))
            .count()
    }

    // Sort the items by the given order; picking the same order twice reverses it.
    // The items are sorted again each time since creates and edits can break the order.
    pub fn set_sort(&mut self, sorted_by: SortedBy) {
        let descending = self.sorted_by == Some(sorted_by) && !self.sort_descending;

        self.items.sort_by(|a, b| {
            let ordering = match sorted_by {
                SortedBy::ByName => a.title.cmp(&b.title),
                SortedBy::ByPriority => b.priority.cmp(&a.priority),
                // Todos without a due date go last
                SortedBy::ByDueDate => match (a.due_date, b.due_date) {
                    (Some(a), Some(b)) => a.cmp(&b),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                },
            };
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });

        self.sorted_by = Some(sorted_by);
        self.sort_descending = descending;
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

// Build the UI (list) for the visible todos
pub fn get_list_items_ui<'a>(todos: &[&'a Todo]) -> Vec<ListItem<'a>> {
    let now = Local::now();
    todos
        .iter()
        .map(|&todo| {
            let mut lines = Vec::new();

            let title_style = if todo.completed {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(Color::White)
            };

            lines.push(Line::from(vec![
                Span::from(if todo.completed { "[✓] " } else { "[ ] " }),
                Span::styled(todo.title.as_str(), title_style),
            ]));

            if let Some(description) = &todo.description {
                lines.push(Line::from(Span::styled(
                    format!("    {description}"),
                    Style::default().fg(Color::Gray),
                )));
            }

            let mut details = vec![
                Span::from("    "),
                Span::from(format!("{} Priority", capitalize(todo.priority.as_str())))
                    .fg(priority_color(todo.priority)),
            ];
            if let Some(due_date) = todo.due_date {
                let due = format!("  Due: {}", due_date.format(DATE_FORMAT));
                if is_overdue_at(todo, &now) {
                    details.push(Span::from(due).fg(Color::Red));
                    details.push(Span::from(" OVERDUE").fg(Color::Red).bold());
                } else {
                    details.push(Span::from(due));
                }
            }
            details.push(
                Span::from(format!(
                    "  Created: {}",
                    todo.created_at.with_timezone(&Local).format(DATE_FORMAT)
                ))
                .fg(Color::DarkGray),
            );
            lines.push(Line::from(details));

            ListItem::new(lines)
        })
        .collect()
}

// Build the UI (lines) for the filter bar
pub fn get_filters_ui<'a>(list: &TodoList<'a>) -> Line<'a> {
    let status = |filter: StatusFilter, label: String| {
        if list.status_filter == filter {
            Span::from(format!("[{label}] ")).bold().fg(Color::LightGreen)
        } else {
            Span::from(format!(" {label}  "))
        }
    };

    Line::from(vec![
        Span::from("Filter: "),
        status(StatusFilter::All, format!("All ({})", list.items.len())),
        status(StatusFilter::Active, format!("Active ({})", list.count_active())),
        status(
            StatusFilter::Completed,
            format!("Completed ({})", list.count_completed()),
        ),
        Span::from(format!("| {}", list.priority_filter.label())),
    ])
}

// Build the UI (lines) for statistics infobox
pub fn get_statistics_ui<'a>(list: &TodoList<'a>) -> Vec<Line<'a>> {
    vec![
        Line::from(format!("Total tasks: {}", list.items.len())),
        Line::from(format!("Completed: {}", list.count_completed())),
        Line::from(format!("Remaining: {}", list.count_active())),
        Line::from(format!("Overdue: {}", list.count_overdue_at(&Local::now()))),
    ]
}

// Build the UI (lines) for instructions infobox
pub fn get_instructions_ui<'a>() -> Vec<Line<'a>> {
    vec![
        "Enter - toggle do/done".into(),
        "a - add a task".into(),
        "e - edit a task".into(),
        "x - delete a task".into(),
        "f - cycle status filter".into(),
        "p - cycle priority filter".into(),
        "d - sort by due date".into(),
        "n - sort by name".into(),
        "g - sort by priority".into(),
        "r - reload".into(),
        "q - quit".into(),
    ]
}
