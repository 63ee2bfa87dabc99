//! The identity gateway: argon2 password hashing, session tokens, and the
//! [`CurrentUser`] extractor that resolves a request's session cookie.

use std::sync::{Arc, OnceLock};

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{TimeDelta, Utc};
use rand_core::{OsRng, RngCore};
use rolodex_core::{
  Error as CoreError, Result as CoreResult,
  account::{Identity, PasswordPolicy, RegistrationForm, SessionToken, User},
  gateway::IdentityGateway,
  store::{AccountStore, NewSession},
  validate::FieldErrors,
};
use sha2::{Digest, Sha256};

use crate::{AppState, Backend, error::Error, session};

// ─── Password hashing ────────────────────────────────────────────────────────

/// Produce an argon2 PHC string for `password` off the async runtime.
pub async fn hash_password(password: String) -> CoreResult<String> {
  tokio::task::spawn_blocking(move || {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map(|h| h.to_string())
      .map_err(|e| CoreError::Store(format!("argon2 error: {e}").into()))
  })
  .await
  .map_err(CoreError::store)?
}

/// Check `password` against a PHC string. A malformed hash never verifies.
pub async fn verify_password(password: String, hash: String) -> CoreResult<bool> {
  tokio::task::spawn_blocking(move || {
    PasswordHash::new(&hash).is_ok_and(|parsed| {
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
  })
  .await
  .map_err(CoreError::store)
}

/// A real argon2 hash that no user's password is checked against. Verifying
/// it costs the same as verifying a stored hash.
fn dummy_hash() -> &'static str {
  static DUMMY: OnceLock<String> = OnceLock::new();
  DUMMY.get_or_init(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(b"rolodex unknown user", &salt)
      .map(|h| h.to_string())
      .unwrap_or_default()
  })
}

/// Spend one argon2 verification on a login for a username that does not
/// exist, so it takes as long as a wrong password.
async fn verify_unknown_user(password: String) -> CoreResult<()> {
  tokio::task::spawn_blocking(move || {
    if let Ok(parsed) = PasswordHash::new(dummy_hash()) {
      let _ = Argon2::default().verify_password(password.as_bytes(), &parsed);
    }
  })
  .await
  .map_err(CoreError::store)
}

// ─── Session tokens ──────────────────────────────────────────────────────────

fn new_token() -> SessionToken {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  SessionToken::new(hex::encode(bytes))
}

/// The value stored server-side for `token`.
pub fn token_digest(token: &SessionToken) -> String {
  hex::encode(Sha256::digest(token.as_str().as_bytes()))
}

// ─── Gateway ─────────────────────────────────────────────────────────────────

/// [`IdentityGateway`] backed by an [`AccountStore`].
pub struct Gateway<S> {
  store:       Arc<S>,
  policy:      PasswordPolicy,
  session_ttl: TimeDelta,
}

impl<S: AccountStore> Gateway<S> {
  pub fn new(store: Arc<S>, policy: PasswordPolicy, session_ttl_hours: u32) -> Self {
    Self {
      store,
      policy,
      session_ttl: TimeDelta::hours(i64::from(session_ttl_hours)),
    }
  }

  pub fn session_ttl(&self) -> TimeDelta { self.session_ttl }
}

fn username_taken() -> CoreError {
  let mut errors = FieldErrors::new();
  errors.add("username", "A user with that username already exists.");
  CoreError::Invalid(errors)
}

impl<S: AccountStore> IdentityGateway for Gateway<S> {
  async fn register<'a>(&'a self, form: &'a RegistrationForm) -> CoreResult<User> {
    let username = form.validate(&self.policy).map_err(CoreError::Invalid)?;

    // Skips hashing for a taken name. The insert is what enforces uniqueness.
    if self
      .store
      .find_credentials(username.clone())
      .await
      .map_err(CoreError::store)?
      .is_some()
    {
      return Err(username_taken());
    }

    let password_hash = hash_password(form.password1.clone()).await?;
    let user = self
      .store
      .insert_user(username, password_hash)
      .await
      .map_err(CoreError::store)?
      .ok_or_else(username_taken)?;

    tracing::info!(username = %user.username, "registered new user");
    Ok(user)
  }

  async fn authenticate<'a>(
    &'a self,
    username: &'a str,
    password: &'a str,
  ) -> CoreResult<Option<Identity>> {
    let Some(creds) = self
      .store
      .find_credentials(username.trim().to_owned())
      .await
      .map_err(CoreError::store)?
    else {
      verify_unknown_user(password.to_owned()).await?;
      return Ok(None);
    };

    let verified =
      verify_password(password.to_owned(), creds.password_hash).await?;
    Ok(verified.then(|| Identity::from(creds.user)))
  }

  async fn current_identity<'a>(
    &'a self,
    token: &'a SessionToken,
  ) -> CoreResult<Option<Identity>> {
    let user = self
      .store
      .session_user(token_digest(token), Utc::now())
      .await
      .map_err(CoreError::store)?;
    Ok(user.map(Identity::from))
  }

  async fn establish_session<'a>(
    &'a self,
    identity: &'a Identity,
  ) -> CoreResult<SessionToken> {
    let now = Utc::now();
    let expires_at = now.checked_add_signed(self.session_ttl).ok_or_else(|| {
      CoreError::Store(
        format!("session ttl of {} hours is out of range", self.session_ttl.num_hours())
          .into(),
      )
    })?;

    let purged = self
      .store
      .purge_expired_sessions(now)
      .await
      .map_err(CoreError::store)?;
    if purged > 0 {
      tracing::debug!(purged, "purged expired sessions");
    }

    let token = new_token();
    self
      .store
      .insert_session(NewSession {
        token_hash: token_digest(&token),
        user_id:    identity.user_id,
        expires_at,
      })
      .await
      .map_err(CoreError::store)?;

    tracing::info!(username = %identity.username, "session established");
    Ok(token)
  }

  async fn clear_session<'a>(&'a self, token: &'a SessionToken) -> CoreResult<()> {
    self
      .store
      .delete_session(token_digest(token))
      .await
      .map_err(CoreError::store)
  }
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// Who is making the request, resolved from the session cookie.
///
/// Never rejects for a missing or stale session: `identity` is simply `None`
/// and the registry decides whether that matters.
pub struct CurrentUser {
  pub identity: Option<Identity>,
  pub token:    Option<SessionToken>,
  /// Request path, used as the post-login destination.
  pub path:     String,
}

impl CurrentUser {
  pub fn identity(&self) -> Option<&Identity> { self.identity.as_ref() }

  /// The identity, or an [`Error::AuthRequired`] that returns here after
  /// login.
  pub fn require(&self) -> Result<&Identity, Error> {
    self.identity.as_ref().ok_or_else(|| self.login_required())
  }

  /// Convert a registry error, remembering this request's path if the
  /// failure was a missing login.
  pub fn reject(&self, e: CoreError) -> Error {
    match e {
      CoreError::AuthRequired => self.login_required(),
      other => other.into(),
    }
  }

  fn login_required(&self) -> Error {
    Error::AuthRequired { next: Some(self.path.clone()) }
  }
}

impl<S: Backend> FromRequestParts<AppState<S>> for CurrentUser {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let path = parts.uri.path().to_owned();
    let Some(token) = session::session_token(&parts.headers) else {
      return Ok(CurrentUser { identity: None, token: None, path });
    };

    let identity = state.gateway.current_identity(&token).await?;
    Ok(CurrentUser { identity, token: Some(token), path })
  }
}

#[cfg(test)]
mod tests {
  use rolodex_store_sqlite::SqliteStore;

  use super::*;

  async fn gateway() -> Gateway<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    Gateway::new(Arc::new(store), PasswordPolicy::default(), 1)
  }

  fn form(username: &str, p1: &str, p2: &str) -> RegistrationForm {
    RegistrationForm {
      username:  username.into(),
      password1: p1.into(),
      password2: p2.into(),
    }
  }

  #[tokio::test]
  async fn register_then_authenticate() {
    let gw = gateway().await;
    let user = gw.register(&form("alice", "p1", "p1")).await.unwrap();
    assert_eq!(user.username, "alice");

    let identity = gw.authenticate("alice", "p1").await.unwrap().unwrap();
    assert_eq!(identity.user_id, user.user_id);
  }

  #[tokio::test]
  async fn wrong_password_and_unknown_user_look_the_same() {
    let gw = gateway().await;
    gw.register(&form("alice", "p1", "p1")).await.unwrap();

    assert!(gw.authenticate("alice", "wrong").await.unwrap().is_none());
    assert!(gw.authenticate("mallory", "p1").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn duplicate_username_is_a_field_error() {
    let gw = gateway().await;
    gw.register(&form("alice", "p1", "p1")).await.unwrap();

    let err = gw.register(&form("alice", "p2", "p2")).await.unwrap_err();
    assert!(matches!(err, CoreError::Invalid(ref e) if e.has("username")));
  }

  #[tokio::test]
  async fn mismatched_passwords_create_nothing() {
    let gw = gateway().await;
    let err = gw.register(&form("alice", "p1", "p2")).await.unwrap_err();
    assert!(matches!(err, CoreError::Invalid(ref e) if e.has("password2")));
    assert!(gw.authenticate("alice", "p1").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn session_lifecycle() {
    let gw = gateway().await;
    gw.register(&form("alice", "p1", "p1")).await.unwrap();
    let identity = gw.authenticate("alice", "p1").await.unwrap().unwrap();

    let token = gw.establish_session(&identity).await.unwrap();
    assert_eq!(gw.current_identity(&token).await.unwrap(), Some(identity));

    gw.clear_session(&token).await.unwrap();
    assert!(gw.current_identity(&token).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn forged_token_resolves_to_nobody() {
    let gw = gateway().await;
    let forged = SessionToken::new("00".repeat(32));
    assert!(gw.current_identity(&forged).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn oversized_session_ttl_is_an_error() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let gw = Gateway::new(Arc::new(store), PasswordPolicy::default(), u32::MAX);
    gw.register(&form("alice", "p1", "p1")).await.unwrap();
    let identity = gw.authenticate("alice", "p1").await.unwrap().unwrap();

    let err = gw.establish_session(&identity).await.unwrap_err();
    assert!(matches!(err, CoreError::Store(_)));
  }

  #[test]
  fn unknown_users_are_checked_against_a_real_hash() {
    let hash = dummy_hash();
    assert!(hash.starts_with("$argon2id$"));
    let parsed = PasswordHash::new(hash).unwrap();
    assert!(
      Argon2::default()
        .verify_password(b"p1", &parsed)
        .is_err()
    );
  }

  #[test]
  fn digest_is_not_the_token() {
    let token = new_token();
    assert_eq!(token.as_str().len(), 64);
    assert_ne!(token_digest(&token), token.as_str());
    assert_eq!(token_digest(&token), token_digest(&token.clone()));
  }
}
