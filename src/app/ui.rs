use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{prelude::*, widgets::*};
use std::{
    io,
    time::{Duration, Instant},
};

use crate::app::procedures::TodoProcedures;
use crate::app::{todo_edit::*, todo_list::*};

pub struct App<'a> {
    pub items: TodoList<'a>,
    pub todo_edit_dialog_state: TodoEditDialogState,
    pub api: &'a dyn TodoProcedures,
}

impl<'a> App<'a> {
    pub fn new(api: &'a dyn TodoProcedures) -> App<'a> {
        App {
            items: TodoList::with_items_from_api(api),
            todo_edit_dialog_state: TodoEditDialogState::default(),
            api,
        }
    }
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    tick_rate: Duration,
) -> io::Result<()> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| draw_ui(f, &mut app))?;
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let dialog = &mut app.todo_edit_dialog_state;
                    if dialog.dialog_active {
                        // Input for the add/edit dialog
                        match key.code {
                            KeyCode::Down => dialog.move_cursor_down(),
                            KeyCode::Up => dialog.move_cursor_up(),
                            KeyCode::Esc => dialog.cancel(),
                            KeyCode::Enter => dialog.save_todo(app.api, &mut app.items),
                            KeyCode::Left => dialog.move_cursor_left(),
                            KeyCode::Right => dialog.move_cursor_right(),
                            KeyCode::Backspace => dialog.delete_char(),
                            KeyCode::Char(to_insert) => dialog.input(to_insert),
                            _ => {}
                        }
                    } else {
                        // Input for list navigation, filtering, sorting and state change
                        match key.code {
                            KeyCode::Char('q') => return Ok(()),
                            KeyCode::Char('x') => app.items.delete_selected(),
                            KeyCode::Left => app.items.unselect(),
                            KeyCode::Down => app.items.next(),
                            KeyCode::Up => app.items.previous(),
                            KeyCode::Char('a') => dialog.create_a_new_todo(),
                            KeyCode::Char('e') => {
                                if let Some(todo) = app.items.get_selected() {
                                    dialog.edit_todo(todo);
                                }
                            }
                            KeyCode::Char('f') => app.items.cycle_status_filter(),
                            KeyCode::Char('p') => app.items.cycle_priority_filter(),
                            KeyCode::Char('d') => app.items.set_sort(SortedBy::ByDueDate),
                            KeyCode::Char('n') => app.items.set_sort(SortedBy::ByName),
                            KeyCode::Char('g') => app.items.set_sort(SortedBy::ByPriority),
                            KeyCode::Char('r') => app.items.reload(),
                            KeyCode::Enter => app.items.toggle_completed(),
                            _ => {}
                        }
                    }
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
}

// Draws the whole user interface
fn draw_ui(f: &mut Frame, app: &mut App) {
    // Filter bar on top, list and side panels below, status line at the bottom
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.size());

    let filters = Paragraph::new(get_filters_ui(&app.items))
        .block(Block::default().borders(Borders::ALL).title("Todo Manager"));
    f.render_widget(filters, rows[0]);

    // Split the middle in 60-40 ratio
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);

    // DRAW LEFT PART
    let visible = app.items.visible();
    if visible.is_empty() {
        let message = if app.items.items.is_empty() {
            "No tasks yet. Press 'a' to create your first task!"
        } else {
            "No tasks match your current filters."
        };
        let empty = Paragraph::new(message)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("List"));
        f.render_widget(empty, chunks[0]);
    } else {
        let todo_list = List::new(get_list_items_ui(&visible))
            .block(Block::default().borders(Borders::ALL).title("List"))
            .highlight_style(
                Style::default()
                    .bg(Color::LightGreen)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">> ");
        let mut state = app.items.state.clone();
        f.render_stateful_widget(todo_list, chunks[0], &mut state);
        app.items.state = state;
    }

    // DRAW RIGHT PART
    if app.todo_edit_dialog_state.dialog_active {
        let create_or_edit_todo = Paragraph::new(get_todo_edit_ui(&app.todo_edit_dialog_state))
            .block(Block::new().title("Add/Edit Task").borders(Borders::ALL))
            .style(Style::new().white());

        f.render_widget(create_or_edit_todo, chunks[1]);
    } else {
        // If not editing, display statistics and instructions in vertically split layout
        let right_side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(chunks[1]);

        let instructions = Paragraph::new(get_instructions_ui())
            .block(Block::new().title("Commands").borders(Borders::ALL))
            .style(Style::new().white());

        let statistics = Paragraph::new(get_statistics_ui(&app.items))
            .block(Block::new().title("Statistics").borders(Borders::ALL))
            .style(Style::new().white());

        f.render_widget(instructions, right_side[0]);
        f.render_widget(statistics, right_side[1]);
    }

    // Last failed call, if any
    if let Some(error) = &app.items.last_error {
        f.render_widget(
            Paragraph::new(error.as_str()).style(Style::new().fg(Color::Red)),
            rows[2],
        );
    }
}
