//! SQLite persistence
//!
//! [`Database`] owns the pool and is the entry point for handlers and the
//! sync job. The free functions in [`ops`] do the actual queries.

mod models;
pub mod ops;
mod repository;
pub mod schema;

pub use models::*;
pub use repository::Database;
