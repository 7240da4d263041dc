//! Biblio library lending server
//!
//! REST JSON API for a lending library: bearer-token authentication with
//! role guards, a material catalog, and a loan lifecycle that never lets one
//! material be on loan twice.

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<services::Services>,
    pub pool: Pool<Postgres>,
}
