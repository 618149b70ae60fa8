//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - Persisted models and the stats snapshot types

mod database;
mod models;

pub use database::{CommentQuery, CommentSort, Database};
pub use models::*;
