//! Storage traits for clients and accounts.
//!
//! Implemented by storage backends (e.g. `rolodex-store-sqlite`). The
//! registry and the identity gateway depend on these abstractions, never on a
//! concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  account::User,
  client::{Client, ClientFields, ClientId},
};

// ─── Clients ─────────────────────────────────────────────────────────────────

/// Persistence for client records. No method performs authorization; that is
/// the registry's job.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ClientStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new client owned by `owner`. Both timestamps are set by the
  /// store to the same instant.
  fn insert_client(
    &self,
    owner: Uuid,
    fields: ClientFields,
  ) -> impl Future<Output = Result<Client, Self::Error>> + Send + '_;

  /// Retrieve a client by id. Returns `None` if not found.
  fn get_client(
    &self,
    id: ClientId,
  ) -> impl Future<Output = Result<Option<Client>, Self::Error>> + Send + '_;

  /// All clients owned by `owner`, in insertion order.
  fn list_clients(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<Vec<Client>, Self::Error>> + Send + '_;

  /// Overwrite a client's fields and owner.
  ///
  /// `updated_at` is set by the store and is always strictly later than the
  /// previous value; `created_at` is untouched. Returns `None` if the client
  /// does not exist.
  fn update_client(
    &self,
    id: ClientId,
    owner: Uuid,
    fields: ClientFields,
  ) -> impl Future<Output = Result<Option<Client>, Self::Error>> + Send + '_;

  /// Delete a client if it is currently owned by `owner`. Returns `false`
  /// if no such client exists or it belongs to someone else.
  fn delete_client(
    &self,
    id: ClientId,
    owner: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// A user together with the stored password hash, as needed to verify a
/// login.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub user:          User,
  /// PHC string, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// A session row. `token_hash` is the hex SHA-256 digest of the token the
/// client holds.
#[derive(Debug, Clone)]
pub struct NewSession {
  pub token_hash: String,
  pub user_id:    Uuid,
  pub expires_at: DateTime<Utc>,
}

/// Persistence for users and their sessions.
pub trait AccountStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create a user. Returns `None` if `username` is already taken
  /// (case-sensitive).
  fn insert_user(
    &self,
    username: String,
    password_hash: String,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up a user and their password hash by exact username.
  fn find_credentials(
    &self,
    username: String,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + '_;

  fn insert_session(
    &self,
    session: NewSession,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The user owning the session with `token_hash`, if it exists and expires
  /// after `now`.
  fn session_user(
    &self,
    token_hash: String,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Remove a session. Removing an unknown session is not an error.
  fn delete_session(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove every session that expired at or before `now`; returns how many.
  fn purge_expired_sessions(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
