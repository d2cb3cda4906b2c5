// The typed procedures shared by the server and the client.
// The server runs them against a `TodoService`, the client calls them through `RemoteTodos`.
use log::{error, info};

use crate::app::error::TodoError;
use crate::app::models::{
    CreateTodoInput, DeleteResult, DeleteTodoInput, GetTodoInput, Todo, UpdateTodoInput,
};
use crate::app::storage::Storage;

pub trait TodoProcedures {
    fn create_todo(&self, input: CreateTodoInput) -> Result<Todo, TodoError>;
    fn get_todos(&self) -> Result<Vec<Todo>, TodoError>;
    fn get_todo(&self, input: GetTodoInput) -> Result<Option<Todo>, TodoError>;
    fn update_todo(&self, input: UpdateTodoInput) -> Result<Todo, TodoError>;
    fn delete_todo(&self, input: DeleteTodoInput) -> Result<DeleteResult, TodoError>;
}

/// Validates every input before it reaches the store.
pub struct TodoService {
    storage: Storage,
}

impl TodoService {
    pub fn new(storage: Storage) -> TodoService {
        TodoService { storage }
    }
}

impl TodoProcedures for TodoService {
    fn create_todo(&self, input: CreateTodoInput) -> Result<Todo, TodoError> {
        let input = input.validate()?;
        let todo = self.storage.insert_todo(&input).map_err(|err| {
            error!("Todo creation failed: {err}");
            err
        })?;
        info!("created todo {} ({})", todo.id, todo.priority);
        Ok(todo)
    }

    fn get_todos(&self) -> Result<Vec<Todo>, TodoError> {
        self.storage.get_all_todos()
    }

    fn get_todo(&self, input: GetTodoInput) -> Result<Option<Todo>, TodoError> {
        self.storage.get_todo(input.id)
    }

    fn update_todo(&self, input: UpdateTodoInput) -> Result<Todo, TodoError> {
        let input = input.validate()?;
        let todo = self.storage.update_todo(&input)?;
        info!("updated todo {}", todo.id);
        Ok(todo)
    }

    fn delete_todo(&self, input: DeleteTodoInput) -> Result<DeleteResult, TodoError> {
        let success = self.storage.delete_todo(input.id)?;
        if success {
            info!("deleted todo {}", input.id);
        }
        Ok(DeleteResult { success })
    }
}
