//! Error types and axum `IntoResponse` implementation.

use axum::{
  http::StatusCode,
  response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::{pages, session};

#[derive(Debug, Error)]
pub enum Error {
  /// No session; the user is sent to the login page and back to `next`.
  #[error("authentication required")]
  AuthRequired { next: Option<String> },
  #[error("not found")]
  NotFound,
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<rolodex_core::Error> for Error {
  fn from(e: rolodex_core::Error) -> Self {
    use rolodex_core::Error as Core;
    match e {
      Core::AuthRequired => Error::AuthRequired { next: None },
      Core::NotFound(_) => Error::NotFound,
      Core::Store(e) => Error::Store(e),
      // Handlers turn these into a flash redirect or a form re-render before
      // converting; reaching here is a bug.
      other @ (Core::Forbidden(_) | Core::Invalid(_)) => {
        Error::Store(Box::new(other))
      }
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::AuthRequired { next } => session::redirect(&pages::login_url(next.as_deref())),
      Error::NotFound => {
        (StatusCode::NOT_FOUND, Html(pages::not_found())).into_response()
      }
      Error::Store(e) => {
        tracing::error!("store error: {e}");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
          .into_response()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use axum::http::header;
  use rolodex_core::validate::FieldErrors;

  use super::*;

  #[test]
  fn unhandled_registry_outcomes_are_server_errors() {
    for e in [
      rolodex_core::Error::Forbidden(3),
      rolodex_core::Error::Invalid(FieldErrors::new()),
    ] {
      let res = Error::from(e).into_response();
      assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
  }

  #[test]
  fn missing_login_redirects_without_replaying_deletes() {
    let res = Error::AuthRequired { next: Some("/delete-client/3".into()) }
      .into_response();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[header::LOCATION], "/user-login");
  }
}
