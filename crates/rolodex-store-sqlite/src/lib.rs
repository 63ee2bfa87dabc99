//! SQLite backend for Rolodex.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One [`SqliteStore`] implements both
//! [`ClientStore`](rolodex_core::store::ClientStore) and
//! [`AccountStore`](rolodex_core::store::AccountStore).

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
