//! Client pages: dashboard, add, details, update, delete.
//!
//! Every handler hands the caller's identity to the registry and lets it
//! decide; only the translation of its errors into pages and redirects
//! happens here.

use axum::{
  Form,
  extract::{Path, State},
  response::Response,
};
use rolodex_core::{
  Error as CoreError,
  client::{ClientForm, ClientId},
  validate::FieldErrors,
};

use crate::{
  AppState, Backend,
  auth::CurrentUser,
  error::Error,
  pages::{self, DASHBOARD_PATH},
  session::{self, Flash, FlashMessage},
};

/// Bounce back to the dashboard with an error flash instead of a 403 page.
fn refuse<S: Backend>(
  state: &AppState<S>,
  user: &CurrentUser,
  id: ClientId,
  message: &str,
) -> Response {
  tracing::warn!(
    client_id = id,
    username = user.identity().map(|i| i.username.as_str()).unwrap_or_default(),
    "refused access to client owned by another user",
  );
  session::redirect_with_flash(&state.cookies(), DASHBOARD_PATH, FlashMessage::error(message))
}

fn saved<S: Backend>(state: &AppState<S>, message: &str) -> Response {
  session::redirect_with_flash(&state.cookies(), DASHBOARD_PATH, FlashMessage::success(message))
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

pub async fn dashboard<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  flash: Flash,
) -> Result<Response, Error> {
  let clients = state
    .registry()
    .list(user.identity())
    .await
    .map_err(|e| user.reject(e))?;
  let body = pages::dashboard(&clients);
  Ok(super::render(&state, &flash, user.identity(), "Dashboard", &body))
}

// ─── Add ─────────────────────────────────────────────────────────────────────

pub async fn add_form<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  flash: Flash,
) -> Result<Response, Error> {
  let who = user.require()?;
  let body = pages::client_form(
    "Add client",
    "/add-client",
    &ClientForm::default(),
    &FieldErrors::new(),
  );
  Ok(super::render(&state, &flash, Some(who), "Add client", &body))
}

pub async fn add<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  flash: Flash,
  Form(form): Form<ClientForm>,
) -> Result<Response, Error> {
  match state.registry().create(user.identity(), &form).await {
    Ok(client) => {
      tracing::info!(client_id = client.client_id, "client created");
      Ok(saved(&state, "Your client was created!"))
    }
    Err(CoreError::Invalid(errors)) => {
      let body = pages::client_form("Add client", "/add-client", &form, &errors);
      Ok(super::render(&state, &flash, user.identity(), "Add client", &body))
    }
    Err(e) => Err(user.reject(e)),
  }
}

// ─── Details ─────────────────────────────────────────────────────────────────

pub async fn details<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  flash: Flash,
  Path(id): Path<ClientId>,
) -> Result<Response, Error> {
  match state.registry().read(user.identity(), id).await {
    Ok(client) => {
      let body = pages::client_detail(&client);
      Ok(super::render(&state, &flash, user.identity(), &client.to_string(), &body))
    }
    Err(CoreError::Forbidden(id)) => Ok(refuse(
      &state,
      &user,
      id,
      "You are not authorized to view this client.",
    )),
    Err(e) => Err(user.reject(e)),
  }
}

// ─── Update ──────────────────────────────────────────────────────────────────

fn update_action(id: ClientId) -> String { format!("/update-client/{id}") }

pub async fn update_form<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  flash: Flash,
  Path(id): Path<ClientId>,
) -> Result<Response, Error> {
  let client = match state.registry().read(user.identity(), id).await {
    Ok(client) => client,
    Err(CoreError::Forbidden(id)) => {
      return Ok(refuse(&state, &user, id, "You are not authorized to update this client."));
    }
    Err(e) => return Err(user.reject(e)),
  };

  let who = user.require()?;
  if state.config.ownership.preserve_owner_on_update && !client.is_owned_by(who.user_id) {
    return Ok(refuse(&state, &user, id, "You are not authorized to update this client."));
  }

  let body = pages::client_form(
    "Update client",
    &update_action(id),
    &ClientForm::from(&client.fields),
    &FieldErrors::new(),
  );
  Ok(super::render(&state, &flash, Some(who), "Update client", &body))
}

pub async fn update<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  flash: Flash,
  Path(id): Path<ClientId>,
  Form(form): Form<ClientForm>,
) -> Result<Response, Error> {
  match state.registry().update(user.identity(), id, &form).await {
    Ok(client) => {
      tracing::info!(client_id = client.client_id, "client updated");
      Ok(saved(&state, "Your client was updated!"))
    }
    Err(CoreError::Invalid(errors)) => {
      let body = pages::client_form("Update client", &update_action(id), &form, &errors);
      Ok(super::render(&state, &flash, user.identity(), "Update client", &body))
    }
    Err(CoreError::Forbidden(id)) => Ok(refuse(
      &state,
      &user,
      id,
      "You are not authorized to update this client.",
    )),
    Err(e) => Err(user.reject(e)),
  }
}

// ─── Delete ──────────────────────────────────────────────────────────────────

pub async fn delete<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<ClientId>,
) -> Result<Response, Error> {
  match state.registry().delete(user.identity(), id).await {
    Ok(client) => {
      tracing::info!(client_id = client.client_id, "client deleted");
      Ok(saved(&state, "Your client was deleted!"))
    }
    Err(CoreError::Forbidden(id)) => Ok(refuse(
      &state,
      &user,
      id,
      "You are not authorized to delete this client.",
    )),
    Err(e) => Err(user.reject(e)),
  }
}
