//! studylog - personal study-tracking API service
//!
//! Users sign up, create subjects, bump per-subject activity counters, and
//! keep a free-text "lag" journal (Subject → Chapter → Body-entries) with
//! substring search and category tags. Exposed as a JSON API over SQLite.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod store;

pub use api::AppState;
pub use config::Config;
pub use db::Database;
pub use error::ApiError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
