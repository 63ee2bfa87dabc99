//! The `IdentityGateway` trait, the only way the rest of the system learns
//! who is making a request.
//!
//! Password hashing and session mechanics live behind this trait (see
//! `rolodex-web`'s `auth` module). Callers receive an [`Identity`] and pass it
//! explicitly into registry operations.

use std::future::Future;

use crate::{
  Result,
  account::{Identity, RegistrationForm, SessionToken, User},
};

pub trait IdentityGateway: Send + Sync {
  /// Create an account.
  ///
  /// Fails with [`Error::Invalid`](crate::Error::Invalid) if the form does
  /// not validate or the username is already taken.
  fn register<'a>(
    &'a self,
    form: &'a RegistrationForm,
  ) -> impl Future<Output = Result<User>> + Send + 'a;

  /// Check a username/password pair. Unknown users and wrong passwords are
  /// indistinguishable: both yield `None`.
  fn authenticate<'a>(
    &'a self,
    username: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Option<Identity>>> + Send + 'a;

  /// Resolve a session token presented by the client.
  fn current_identity<'a>(
    &'a self,
    token: &'a SessionToken,
  ) -> impl Future<Output = Result<Option<Identity>>> + Send + 'a;

  /// Start a session for `identity` and return the token the client must
  /// present on later requests.
  fn establish_session<'a>(
    &'a self,
    identity: &'a Identity,
  ) -> impl Future<Output = Result<SessionToken>> + Send + 'a;

  /// End the session identified by `token`.
  fn clear_session<'a>(
    &'a self,
    token: &'a SessionToken,
  ) -> impl Future<Output = Result<()>> + Send + 'a;
}
