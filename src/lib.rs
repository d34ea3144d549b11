pub mod config;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod models;
pub mod roster;
pub mod routes;
pub mod services;
pub mod utils;
pub mod websocket;

pub use error::{AppError, AppResult};
pub use roster::Roster;
