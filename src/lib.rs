//! Library management server
//!
//! REST JSON API for a library's staff: user registration and login,
//! authors, and the book catalog with partial updates and filtered search.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers; each service owns the
/// configuration section it needs
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<services::Services>,
}
