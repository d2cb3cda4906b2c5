use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATABASE_PATH: &str = "database.db";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_LOG_FILE: &str = "todo_manager.log";
const DEFAULT_TICK_RATE_MS: u64 = 250;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub database_path: PathBuf,
    pub bind_address: String,
    pub server_url: String,
    pub log_file: PathBuf,
    pub tick_rate: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            server_url: DEFAULT_SERVER_URL.to_string(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            tick_rate: Duration::from_millis(DEFAULT_TICK_RATE_MS),
        }
    }
}

impl Config {
    // Read TODO_* variables, a .env file in the working directory is honoured
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            database_path: lookup("TODO_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            bind_address: lookup("TODO_BIND_ADDRESS").unwrap_or(defaults.bind_address),
            server_url: lookup("TODO_SERVER_URL").unwrap_or(defaults.server_url),
            log_file: lookup("TODO_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
            tick_rate: lookup("TODO_TICK_RATE_MS")
                .and_then(|ms| ms.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_rate),
        }
    }
}
