// Exposes the procedures as typed calls: POST /trpc/<procedureName> with a JSON input
use actix_web::dev::Server;
use actix_web::middleware::Logger;
use actix_web::{get, post, web, App, HttpResponse, HttpServer, Responder};
use log::info;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::app::config::Config;
use crate::app::error::TodoError;
use crate::app::models::{CreateTodoInput, DeleteTodoInput, GetTodoInput, UpdateTodoInput};
use crate::app::procedures::{TodoProcedures, TodoService};
use crate::app::storage::Storage;

pub type SharedService = Mutex<TodoService>;

#[derive(Serialize)]
pub struct Response {
    pub message: String,
}

fn lock(service: &SharedService) -> MutexGuard<'_, TodoService> {
    service.lock().unwrap_or_else(PoisonError::into_inner)
}

#[post("/createTodo")]
pub async fn create_todo(
    service: web::Data<SharedService>,
    input: web::Json<CreateTodoInput>,
) -> Result<HttpResponse, TodoError> {
    let todo = lock(&service).create_todo(input.into_inner())?;
    Ok(HttpResponse::Ok().json(todo))
}

#[post("/getTodos")]
pub async fn get_todos(service: web::Data<SharedService>) -> Result<HttpResponse, TodoError> {
    let todos = lock(&service).get_todos()?;
    Ok(HttpResponse::Ok().json(todos))
}

#[post("/getTodo")]
pub async fn get_todo(
    service: web::Data<SharedService>,
    input: web::Json<GetTodoInput>,
) -> Result<HttpResponse, TodoError> {
    let todo = lock(&service).get_todo(input.into_inner())?;
    Ok(HttpResponse::Ok().json(todo))
}

#[post("/updateTodo")]
pub async fn update_todo(
    service: web::Data<SharedService>,
    input: web::Json<UpdateTodoInput>,
) -> Result<HttpResponse, TodoError> {
    let todo = lock(&service).update_todo(input.into_inner())?;
    Ok(HttpResponse::Ok().json(todo))
}

#[post("/deleteTodo")]
pub async fn delete_todo(
    service: web::Data<SharedService>,
    input: web::Json<DeleteTodoInput>,
) -> Result<HttpResponse, TodoError> {
    let result = lock(&service).delete_todo(input.into_inner())?;
    Ok(HttpResponse::Ok().json(result))
}

#[get("/health")]
async fn healthcheck() -> impl Responder {
    HttpResponse::Ok().json(Response {
        message: "Everything is working fine".to_string(),
    })
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(Response {
        message: "Resource not found".to_string(),
    })
}

// Malformed input is a validation error like an empty title
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| TodoError::validation(err.to_string()).into())
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/trpc")
            .service(create_todo)
            .service(get_todos)
            .service(get_todo)
            .service(update_todo)
            .service(delete_todo),
    )
    .service(healthcheck);
}

// Bind the procedures to `address` and return the running server with the addresses it listens on
pub fn start(service: TodoService, address: &str) -> Result<(Server, Vec<SocketAddr>), TodoError> {
    let data = web::Data::new(Mutex::new(service));
    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .app_data(json_config())
            .configure(routes)
            .default_service(web::route().to(not_found))
            .wrap(Logger::default())
    })
    .bind(address)?;
    let addrs = server.addrs();
    Ok((server.run(), addrs))
}

pub async fn run(config: &Config) -> Result<(), TodoError> {
    let storage = Storage::open(&config.database_path)?;
    let (server, _) = start(TodoService::new(storage), &config.bind_address)?;

    info!(
        "serving todos from {} on {}",
        config.database_path.display(),
        config.bind_address
    );
    server.await?;
    Ok(())
}
