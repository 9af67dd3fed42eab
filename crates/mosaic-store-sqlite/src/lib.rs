//! SQLite backend for the Memory Mosaic store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each person is kept as one JSON
//! document with its memories and comments embedded, which makes every person
//! write a single-row update.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
