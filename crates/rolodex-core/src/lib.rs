//! Core types and trait definitions for Rolodex.
//!
//! No HTTP or database dependencies live here. The crate owns
//! the client data model, form validation, the storage and identity traits,
//! and the ownership-scoped [`registry::Registry`] operations.

// Store impls use native `async fn` against `impl Future + Send` signatures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod client;
pub mod error;
pub mod gateway;
pub mod policy;
pub mod registry;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
