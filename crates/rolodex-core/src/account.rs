//! Accounts, identities and the registration/login forms.
//!
//! Users are owned by the identity gateway; the rest of the system only ever
//! sees an [`Identity`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validate::{FieldErrors, REQUIRED, check_max_length};

pub const USERNAME_MAX_LEN: usize = 150;

// ─── User / Identity ─────────────────────────────────────────────────────────

/// A registered account. The password hash is never part of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub username:   String,
  pub created_at: DateTime<Utc>,
}

/// An authenticated reference to a [`User`], handed out by the gateway after
/// a successful login or session lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
  pub user_id:  Uuid,
  pub username: String,
}

impl From<User> for Identity {
  fn from(u: User) -> Self {
    Self { user_id: u.user_id, username: u.username }
  }
}

/// The secret a client presents to resume a session. Only its digest is ever
/// stored.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
  pub fn new(raw: impl Into<String>) -> Self { Self(raw.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Debug for SessionToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("SessionToken(..)")
  }
}

// ─── Password policy ─────────────────────────────────────────────────────────

/// Rules a new password must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
  pub min_length:      usize,
  /// Reject passwords made only of digits.
  pub reject_numeric:  bool,
  /// Reject passwords equal to the username, ignoring case.
  pub reject_username: bool,
}

impl Default for PasswordPolicy {
  fn default() -> Self {
    Self { min_length: 1, reject_numeric: true, reject_username: true }
  }
}

impl PasswordPolicy {
  fn check(&self, errors: &mut FieldErrors, username: &str, password: &str) {
    let len = password.chars().count();
    if len < self.min_length {
      errors.add(
        "password2",
        format!(
          "This password is too short. It must contain at least {} characters.",
          self.min_length
        ),
      );
    }
    if self.reject_numeric && password.chars().all(|c| c.is_ascii_digit()) {
      errors.add("password2", "This password is entirely numeric.");
    }
    if self.reject_username && password.eq_ignore_ascii_case(username) {
      errors.add("password2", "The password is too similar to the username.");
    }
  }
}

// ─── Registration ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
  pub username:  String,
  pub password1: String,
  /// Confirmation; must equal `password1`.
  pub password2: String,
}

impl RegistrationForm {
  /// Check everything that does not need the user table: username shape,
  /// password confirmation and the password policy.
  ///
  /// Returns the normalised username. Passwords are never trimmed.
  pub fn validate(&self, policy: &PasswordPolicy) -> Result<String, FieldErrors> {
    let mut errors = FieldErrors::new();

    let username = self.username.trim();
    if username.is_empty() {
      errors.add("username", REQUIRED);
    } else {
      check_max_length(&mut errors, "username", username, USERNAME_MAX_LEN);
      if !username.chars().all(is_username_char) {
        errors.add(
          "username",
          "Enter a valid username. This value may contain only letters, \
           numbers, and @/./+/-/_ characters.",
        );
      }
    }

    if self.password1.is_empty() {
      errors.add("password1", REQUIRED);
    }
    if self.password2.is_empty() {
      errors.add("password2", REQUIRED);
    }

    if !self.password1.is_empty() && !self.password2.is_empty() {
      if self.password1 != self.password2 {
        errors.add("password2", "The two password fields didn't match.");
      } else {
        policy.check(&mut errors, username, &self.password2);
      }
    }

    errors.into_result(username.to_owned())
  }
}

fn is_username_char(c: char) -> bool {
  c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
  pub username: String,
  pub password: String,
  /// Where to send the user after logging in.
  pub next:     Option<String>,
}

impl LoginForm {
  pub fn validate(&self) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if self.username.trim().is_empty() {
      errors.add("username", REQUIRED);
    }
    if self.password.is_empty() {
      errors.add("password", REQUIRED);
    }
    errors.into_result(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn form(username: &str, p1: &str, p2: &str) -> RegistrationForm {
    RegistrationForm {
      username:  username.into(),
      password1: p1.into(),
      password2: p2.into(),
    }
  }

  #[test]
  fn short_matching_passwords_pass_default_policy() {
    let username = form("alice", "p1", "p1")
      .validate(&PasswordPolicy::default())
      .unwrap();
    assert_eq!(username, "alice");
  }

  #[test]
  fn mismatched_passwords_are_rejected() {
    let errors = form("alice", "p1", "p2")
      .validate(&PasswordPolicy::default())
      .unwrap_err();
    assert_eq!(errors.get("password2"), ["The two password fields didn't match."]);
  }

  #[test]
  fn username_with_spaces_is_rejected() {
    let errors = form("al ice", "p1", "p1")
      .validate(&PasswordPolicy::default())
      .unwrap_err();
    assert!(errors.has("username"));
    assert!(!errors.has("password2"));
  }

  #[test]
  fn strict_policy_reports_every_violation() {
    let policy = PasswordPolicy { min_length: 8, ..PasswordPolicy::default() };
    let errors = form("1234", "1234", "1234").validate(&policy).unwrap_err();
    assert_eq!(errors.get("password2").len(), 3);
  }

  #[test]
  fn blank_login_fields_are_required() {
    let errors = LoginForm::default().validate().unwrap_err();
    assert!(errors.has("username"));
    assert!(errors.has("password"));
  }
}
