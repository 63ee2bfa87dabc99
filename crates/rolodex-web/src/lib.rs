//! HTTP layer for Rolodex.
//!
//! Exposes an axum [`Router`] serving the account and client pages, backed by
//! any store implementing both [`ClientStore`] and [`AccountStore`].

pub mod auth;
pub mod error;
pub mod handlers;
pub mod pages;
pub mod session;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use rolodex_core::{
  account::PasswordPolicy,
  policy::OwnershipPolicy,
  registry::Registry,
  store::{AccountStore, ClientStore},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::Gateway;
use handlers::{account, clients, home};
use session::CookieOptions;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// `ROLODEX__*` environment.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  /// Add `Secure` to every cookie. Enable when served over HTTPS.
  #[serde(default)]
  pub secure_cookies:    bool,
  #[serde(default = "default_session_ttl_hours")]
  pub session_ttl_hours: u32,
  #[serde(default)]
  pub password:          PasswordPolicy,
  #[serde(default)]
  pub ownership:         OwnershipPolicy,
}

fn default_session_ttl_hours() -> u32 { 14 * 24 }

// ─── Application state ────────────────────────────────────────────────────────

/// Everything a storage backend must provide to run the server.
pub trait Backend: ClientStore + AccountStore + 'static {}

impl<T: ClientStore + AccountStore + 'static> Backend for T {}

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:   Arc<S>,
  pub gateway: Arc<Gateway<S>>,
  pub config:  Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      gateway: Arc::clone(&self.gateway),
      config:  Arc::clone(&self.config),
    }
  }
}

impl<S: Backend> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    let store = Arc::new(store);
    let gateway = Gateway::new(
      Arc::clone(&store),
      config.password,
      config.session_ttl_hours,
    );
    Self {
      store,
      gateway: Arc::new(gateway),
      config: Arc::new(config),
    }
  }

  /// The client registry with the configured ownership rules.
  pub fn registry(&self) -> Registry<'_, S> {
    Registry::new(self.store.as_ref(), self.config.ownership)
  }

  pub fn cookies(&self) -> CookieOptions {
    CookieOptions {
      secure:          self.config.secure_cookies,
      session_max_age: self.gateway.session_ttl().num_seconds(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the Rolodex server.
pub fn router<S: Backend>(state: AppState<S>) -> Router {
  Router::new()
    .route("/",                      get(home::show::<S>))
    .route("/register",              get(account::register_form::<S>).post(account::register::<S>))
    .route("/user-login",            get(account::login_form::<S>).post(account::login::<S>))
    .route("/user-logout",           get(account::logout::<S>).post(account::logout::<S>))
    .route("/client-dashboard",      get(clients::dashboard::<S>))
    .route("/add-client",            get(clients::add_form::<S>).post(clients::add::<S>))
    .route("/client-details/{id}",   get(clients::details::<S>))
    .route("/update-client/{id}",    get(clients::update_form::<S>).post(clients::update::<S>))
    .route("/delete-client/{id}",    get(clients::delete::<S>).post(clients::delete::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
