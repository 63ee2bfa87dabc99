//! Error types for `rolodex-core`.

use thiserror::Error;

use crate::{client::ClientId, validate::FieldErrors};

/// Every way a registry or identity operation can fail.
///
/// `AuthRequired`, `Forbidden` and `Invalid` are recoverable: the web layer
/// turns them into a redirect or a form re-render. `NotFound` maps to a 404
/// page and `Store` to a 500.
#[derive(Debug, Error)]
pub enum Error {
  #[error("authentication required")]
  AuthRequired,

  #[error("client not found: {0}")]
  NotFound(ClientId),

  #[error("client {0} belongs to another user")]
  Forbidden(ClientId),

  #[error("invalid input: {0}")]
  Invalid(FieldErrors),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error into [`Error::Store`].
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
