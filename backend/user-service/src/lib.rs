//! User directory service: CRUD over a Postgres-backed user store plus a
//! manual notify endpoint that publishes the stored record to `user-events`.

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};

use services::UserService;

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
}

impl AppState {
    pub fn new(users: UserService) -> Self {
        Self { users }
    }
}
