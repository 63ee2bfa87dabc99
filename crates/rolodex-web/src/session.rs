//! Cookies: the session token and one-shot flash messages.
//!
//! Cookie headers are parsed and written by hand; the only values ever stored
//! are hex strings, so no quoting or escaping is needed.

use std::convert::Infallible;

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, HeaderValue, StatusCode, header, request::Parts},
  response::{Html, IntoResponse, Redirect, Response},
};
use rolodex_core::account::SessionToken;
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE: &str = "rolodex_session";
pub const FLASH_COOKIE: &str = "rolodex_flash";

// ─── Cookie header plumbing ──────────────────────────────────────────────────

/// Value of the cookie called `name`, if the request carries one.
pub fn read_cookie<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(k, _)| *k == name)
    .map(|(_, v)| v)
}

/// Attributes shared by every cookie this server sets.
#[derive(Debug, Clone, Copy)]
pub struct CookieOptions {
  pub secure:          bool,
  pub session_max_age: i64,
}

impl CookieOptions {
  fn build(&self, name: &str, value: &str, max_age: i64) -> String {
    let mut cookie = format!(
      "{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
    );
    if self.secure {
      cookie.push_str("; Secure");
    }
    cookie
  }

  pub fn session(&self, token: &SessionToken) -> String {
    self.build(SESSION_COOKIE, token.as_str(), self.session_max_age)
  }

  pub fn clear_session(&self) -> String { self.build(SESSION_COOKIE, "", 0) }

  pub fn flash(&self, message: &FlashMessage) -> String {
    self.build(FLASH_COOKIE, &message.encode(), 60)
  }

  pub fn clear_flash(&self) -> String { self.build(FLASH_COOKIE, "", 0) }
}

/// Append a `Set-Cookie` header to `res`.
pub fn set_cookie(res: &mut Response, cookie: String) {
  match HeaderValue::try_from(cookie) {
    Ok(v) => {
      res.headers_mut().append(header::SET_COOKIE, v);
    }
    Err(e) => tracing::error!("dropping unencodable cookie: {e}"),
  }
}

/// The session token presented by the request, if any.
pub fn session_token(headers: &HeaderMap) -> Option<SessionToken> {
  read_cookie(headers, SESSION_COOKIE)
    .filter(|v| !v.is_empty())
    .map(SessionToken::new)
}

// ─── Flash messages ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
  Success,
  Error,
}

/// A one-time notification shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
  pub level:   Level,
  pub message: String,
}

impl FlashMessage {
  pub fn success(message: impl Into<String>) -> Self {
    Self { level: Level::Success, message: message.into() }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self { level: Level::Error, message: message.into() }
  }

  fn encode(&self) -> String {
    hex::encode(serde_json::to_vec(self).unwrap_or_default())
  }

  fn decode(raw: &str) -> Option<Self> {
    let bytes = hex::decode(raw).ok()?;
    serde_json::from_slice(&bytes).ok()
  }
}

/// Extractor: the flash message left by the previous response, if any.
pub struct Flash(pub Option<FlashMessage>);

impl<S: Send + Sync> FromRequestParts<S> for Flash {
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    Ok(Flash(
      read_cookie(&parts.headers, FLASH_COOKIE).and_then(FlashMessage::decode),
    ))
  }
}

// ─── Response helpers ────────────────────────────────────────────────────────

/// `303 See Other` to `to`.
pub fn redirect(to: &str) -> Response { Redirect::to(to).into_response() }

/// Redirect and leave `message` for the next page.
pub fn redirect_with_flash(
  cookies: &CookieOptions,
  to: &str,
  message: FlashMessage,
) -> Response {
  let mut res = redirect(to);
  set_cookie(&mut res, cookies.flash(&message));
  res
}

/// An HTML page; consumes the pending flash message if one was shown.
pub fn page(
  cookies: &CookieOptions,
  status: StatusCode,
  flash: &Flash,
  html: String,
) -> Response {
  let mut res = (status, Html(html)).into_response();
  if flash.0.is_some() {
    set_cookie(&mut res, cookies.clear_flash());
  }
  res
}
