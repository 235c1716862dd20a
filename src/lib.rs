pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod webhook;

pub use config::Config;
pub use error::{AppError, AppResult};
