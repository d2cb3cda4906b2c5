pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod procedures;
pub mod server;
pub mod storage;
pub mod todo_edit;
pub mod todo_list;
pub mod ui;
