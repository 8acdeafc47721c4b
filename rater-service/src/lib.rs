pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use events::{EventBroker, SseFrame, Subscription};
pub use state::AppState;
