// Communication with SQLite
// Every procedure maps to exactly one statement here (update reads the row first)
// Based on https://github.com/rusqlite/rusqlite/blob/master/examples/persons/main.rs
use chrono::{Duration, Utc};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::app::error::TodoError;
use crate::app::models::{CreateTodoInput, Todo, UpdateTodoInput};

const TODO_COLUMNS: &str =
    "id, title, description, completed, priority, due_date, created_at, updated_at";

pub struct Storage {
    pub db_con: Connection,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> Result<Storage, TodoError> {
        let storage = Storage {
            db_con: Connection::open(path)?,
        };
        storage.create_table_if_not_exists()?;
        Ok(storage)
    }

    pub fn open_in_memory() -> Result<Storage, TodoError> {
        let storage = Storage {
            db_con: Connection::open_in_memory()?,
        };
        storage.create_table_if_not_exists()?;
        Ok(storage)
    }

    pub fn create_table_if_not_exists(&self) -> Result<(), TodoError> {
        self.db_con.execute(
            "CREATE TABLE IF NOT EXISTS todos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT,
                completed INTEGER NOT NULL DEFAULT 0,
                priority TEXT NOT NULL DEFAULT 'medium'
                    CHECK (priority IN ('low', 'medium', 'high')),
                due_date DATETIME,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            );",
            (),
        )?;
        Ok(())
    }

    // CREATE
    pub fn insert_todo(&self, input: &CreateTodoInput) -> Result<Todo, TodoError> {
        let now = Utc::now();
        self.db_con.execute(
            "INSERT INTO todos (title, description, completed, priority, due_date, created_at, updated_at)
             VALUES (?1, ?2, 0, ?3, ?4, ?5, ?5);",
            params![&input.title, &input.description, &input.priority, &input.due_date, &now],
        )?;
        let id = self.db_con.last_insert_rowid();
        debug!("inserted todo {id}");

        self.get_todo(id)?.ok_or(TodoError::NotFound(id))
    }

    // READ
    pub fn get_all_todos(&self) -> Result<Vec<Todo>, TodoError> {
        let mut stmt = self.db_con.prepare(&format!(
            "SELECT {TODO_COLUMNS} FROM todos ORDER BY created_at DESC, id DESC"
        ))?;
        let todos = stmt
            .query_map([], todo_from_row)?
            .collect::<rusqlite::Result<Vec<Todo>>>()?;
        Ok(todos)
    }

    pub fn get_todo(&self, id: i64) -> Result<Option<Todo>, TodoError> {
        let todo = self
            .db_con
            .query_row(
                &format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1"),
                [id],
                todo_from_row,
            )
            .optional()?;
        Ok(todo)
    }

    // UPDATE
    // Fields missing from the input keep their stored value
    pub fn update_todo(&self, input: &UpdateTodoInput) -> Result<Todo, TodoError> {
        let tx = self.db_con.unchecked_transaction()?;

        let current = tx
            .query_row(
                &format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1"),
                [input.id],
                todo_from_row,
            )
            .optional()?;
        let Some(current) = current else {
            return Err(TodoError::NotFound(input.id));
        };

        // updated_at must move forward even if the clock did not
        let updated_at = Utc::now().max(current.updated_at + Duration::microseconds(1));
        let todo = Todo {
            title: input.title.clone().unwrap_or(current.title),
            description: input.description.clone().unwrap_or(current.description),
            completed: input.completed.unwrap_or(current.completed),
            priority: input.priority.unwrap_or(current.priority),
            due_date: input.due_date.unwrap_or(current.due_date),
            updated_at,
            ..current
        };

        tx.execute(
            "UPDATE todos
             SET title = ?2, description = ?3, completed = ?4, priority = ?5, due_date = ?6, updated_at = ?7
             WHERE id = ?1;",
            params![
                todo.id,
                &todo.title,
                &todo.description,
                todo.completed,
                &todo.priority,
                &todo.due_date,
                &todo.updated_at
            ],
        )?;
        tx.commit()?;
        debug!("updated todo {}", todo.id);

        Ok(todo)
    }

    // DELETE
    // Returns whether a row was removed
    pub fn delete_todo(&self, id: i64) -> Result<bool, TodoError> {
        let removed = self
            .db_con
            .execute("DELETE FROM todos WHERE id = ?1;", [id])?;
        Ok(removed > 0)
    }
}

fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<Todo> {
    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        completed: row.get(3)?,
        priority: row.get(4)?,
        due_date: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
