// Calls the procedures of a running server over HTTP
use log::debug;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::app::error::{ErrorBody, TodoError};
use crate::app::models::{
    CreateTodoInput, DeleteResult, DeleteTodoInput, GetTodoInput, Todo, UpdateTodoInput,
};
use crate::app::procedures::TodoProcedures;

pub struct RemoteTodos {
    client: Client,
    base_url: String,
}

impl RemoteTodos {
    pub fn new(server_url: &str) -> RemoteTodos {
        RemoteTodos {
            client: Client::new(),
            base_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    fn procedure_url(&self, procedure: &str) -> String {
        format!("{}/trpc/{}", self.base_url, procedure)
    }

    fn call<I: Serialize, O: DeserializeOwned>(
        &self,
        procedure: &str,
        input: Option<&I>,
    ) -> Result<O, TodoError> {
        debug!("calling {procedure}");
        let mut request = self.client.post(self.procedure_url(procedure));
        if let Some(input) = input {
            request = request.json(input);
        }
        let response = request.send()?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<O>()?);
        }

        let text = response.text()?;
        if let Ok(body) = serde_json::from_str::<ErrorBody>(&text) {
            return Err(body.into());
        }
        // Not a procedure error (unknown route, proxy page, ...), keep the status
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|value| value.get("message")?.as_str().map(str::to_string))
            .unwrap_or(text);
        Err(TodoError::Remote {
            code: status_code(status),
            message,
        })
    }
}

// 404 Not Found -> NOT_FOUND, matching the codes the server sends
fn status_code(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("UNKNOWN_ERROR")
        .to_uppercase()
        .replace(' ', "_")
}

impl TodoProcedures for RemoteTodos {
    fn create_todo(&self, input: CreateTodoInput) -> Result<Todo, TodoError> {
        self.call("createTodo", Some(&input))
    }

    fn get_todos(&self) -> Result<Vec<Todo>, TodoError> {
        self.call::<(), _>("getTodos", None)
    }

    fn get_todo(&self, input: GetTodoInput) -> Result<Option<Todo>, TodoError> {
        self.call("getTodo", Some(&input))
    }

    fn update_todo(&self, input: UpdateTodoInput) -> Result<Todo, TodoError> {
        self.call("updateTodo", Some(&input))
    }

    fn delete_todo(&self, input: DeleteTodoInput) -> Result<DeleteResult, TodoError> {
        self.call("deleteTodo", Some(&input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::procedures::TodoService;
    use crate::app::server;
    use crate::app::storage::Storage;
    use std::sync::mpsc;
    use std::thread;

    // Serve a fresh in-memory store on a free port and point a client at it
    fn remote() -> RemoteTodos {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            actix_web::rt::System::new().block_on(async move {
                let service = TodoService::new(Storage::open_in_memory().unwrap());
                let (server, addrs) = server::start(service, "127.0.0.1:0").unwrap();
                tx.send(addrs[0]).unwrap();
                server.await
            })
        });
        let addr = rx.recv().unwrap();
        RemoteTodos::new(&format!("http://{addr}"))
    }

    #[test]
    fn procedure_url_ignores_trailing_slash() {
        let remote = RemoteTodos::new("http://127.0.0.1:8080/");
        assert_eq!(
            remote.procedure_url("getTodos"),
            "http://127.0.0.1:8080/trpc/getTodos"
        );
    }

    #[test]
    fn status_code_follows_the_wire_codes() {
        assert_eq!(status_code(StatusCode::NOT_FOUND), "NOT_FOUND");
        assert_eq!(status_code(StatusCode::BAD_REQUEST), "BAD_REQUEST");
        assert_eq!(
            status_code(StatusCode::INTERNAL_SERVER_ERROR),
            "INTERNAL_SERVER_ERROR"
        );
    }

    #[test]
    fn unreachable_server_is_a_transport_error() {
        // Port 9 (discard) is not served by anything in the test environment
        let remote = RemoteTodos::new("http://127.0.0.1:9");
        let err = remote.get_todos().unwrap_err();
        assert!(matches!(err, TodoError::Transport(_)));
    }

    #[test]
    fn procedures_round_trip_through_the_server() {
        let remote = remote();
        let created = remote.create_todo(CreateTodoInput::new("Buy milk")).unwrap();
        assert_eq!(created.title, "Buy milk");

        let fetched = remote.get_todo(GetTodoInput { id: created.id }).unwrap();
        assert_eq!(fetched, Some(created.clone()));

        let updated = remote
            .update_todo(UpdateTodoInput {
                completed: Some(true),
                ..UpdateTodoInput::new(created.id)
            })
            .unwrap();
        assert!(updated.completed);
        assert_eq!(remote.get_todos().unwrap(), vec![updated]);

        let deleted = remote.delete_todo(DeleteTodoInput { id: created.id }).unwrap();
        assert!(deleted.success);
        assert_eq!(remote.get_todo(GetTodoInput { id: created.id }).unwrap(), None);
    }

    #[test]
    fn procedure_errors_keep_their_code() {
        let remote = remote();
        let err = remote.update_todo(UpdateTodoInput::new(99999)).unwrap_err();
        match err {
            TodoError::Remote { code, message } => {
                assert_eq!(code, "NOT_FOUND");
                assert_eq!(message, "Todo with id 99999 not found");
            }
            other => panic!("unexpected error {other:?}"),
        }

        let err = remote.create_todo(CreateTodoInput::new("  ")).unwrap_err();
        assert!(matches!(err, TodoError::Remote { ref code, .. } if code == "BAD_REQUEST"));
    }

    #[test]
    fn unknown_procedure_keeps_the_status() {
        let remote = remote();
        let err = remote
            .call::<(), DeleteResult>("noSuchProcedure", None)
            .unwrap_err();
        match err {
            TodoError::Remote { code, message } => {
                assert_eq!(code, "NOT_FOUND");
                assert_eq!(message, "Resource not found");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
