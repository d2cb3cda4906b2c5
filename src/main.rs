use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info};
use ratatui::prelude::*;
use std::{error::Error, fs::File, io, path::PathBuf};

mod app;

use app::client::RemoteTodos;
use app::config::Config;
use app::procedures::{TodoProcedures, TodoService};
use app::storage::Storage;

#[derive(Parser)]
#[command(name = "todo_manager")]
#[command(about = "Track todos with a title, priority and due date", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the todo procedures over HTTP
    Serve {
        /// SQLite file holding the todos
        #[arg(long, value_name = "PATH")]
        database: Option<PathBuf>,

        /// Address to listen on, for example 127.0.0.1:8080
        #[arg(long, value_name = "ADDRESS")]
        bind: Option<String>,
    },

    /// Open the terminal client (the default)
    Tui {
        /// URL of a running `serve` instance
        #[arg(long, value_name = "URL", conflicts_with = "local")]
        server: Option<String>,

        /// Skip the server and use the SQLite file directly
        #[arg(long)]
        local: bool,

        /// SQLite file used with --local
        #[arg(long, value_name = "PATH", requires = "local")]
        database: Option<PathBuf>,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let mut config = Config::from_env();

    match cli.command.unwrap_or(Commands::Tui {
        server: None,
        local: false,
        database: None,
    }) {
        Commands::Serve { database, bind } => {
            env_logger::init();
            if let Some(database) = database {
                config.database_path = database;
            }
            if let Some(bind) = bind {
                config.bind_address = bind;
            }
            actix_web::rt::System::new().block_on(app::server::run(&config))?;
        }
        Commands::Tui {
            server,
            local,
            database,
        } => {
            if let Some(server) = server {
                config.server_url = server;
            }
            if let Some(database) = database {
                config.database_path = database;
            }
            // The terminal is taken over by the UI, so logs go to a file
            env_logger::Builder::from_default_env()
                .target(env_logger::Target::Pipe(Box::new(File::create(&config.log_file)?)))
                .init();

            let api: Box<dyn TodoProcedures> = if local {
                info!("using local database {}", config.database_path.display());
                Box::new(TodoService::new(Storage::open(&config.database_path)?))
            } else {
                info!("using server {}", config.server_url);
                Box::new(RemoteTodos::new(&config.server_url))
            };
            run_tui(api.as_ref(), &config)?;
        }
    }

    Ok(())
}

// Start the terminal client.
// Based on https://github.com/ratatui-org/ratatui/blob/main/examples/list.rs
fn run_tui(api: &dyn TodoProcedures, config: &Config) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let app = app::ui::App::new(api);
    let res = app::ui::run_app(&mut terminal, app, config.tick_rate);

    // Restore previous terminal state after exit
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("terminal client failed: {err}");
        println!("{err:?}");
    }

    Ok(())
}
