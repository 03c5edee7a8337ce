pub mod api;
pub mod config;
pub mod db;
pub mod session;

pub use db::DbPool;

use config::Config;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    /// Shared HTTP client for the chat relay.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        Self {
            config,
            db,
            http: reqwest::Client::new(),
        }
    }
}
