//! Registration, login and logout.

use axum::{
  Form,
  extract::{Query, State},
  response::Response,
};
use rolodex_core::{
  Error as CoreError,
  account::{LoginForm, RegistrationForm},
  gateway::IdentityGateway,
  validate::FieldErrors,
};
use serde::Deserialize;

use crate::{
  AppState, Backend,
  auth::CurrentUser,
  error::Error,
  pages::{self, DASHBOARD_PATH, LOGIN_PATH},
  session::{self, Flash, FlashMessage},
};

const BAD_LOGIN: &str = "Please enter a correct username and password. Note \
                         that both fields may be case-sensitive.";

// ─── Register ────────────────────────────────────────────────────────────────

pub async fn register_form<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  flash: Flash,
) -> Response {
  if user.identity.is_some() {
    return session::redirect(DASHBOARD_PATH);
  }
  let body = pages::register("", &FieldErrors::new());
  super::render(&state, &flash, None, "Register", &body)
}

pub async fn register<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  flash: Flash,
  Form(form): Form<RegistrationForm>,
) -> Result<Response, Error> {
  if user.identity.is_some() {
    return Ok(session::redirect(DASHBOARD_PATH));
  }

  match state.gateway.register(&form).await {
    Ok(_) => Ok(session::redirect_with_flash(
      &state.cookies(),
      LOGIN_PATH,
      FlashMessage::success("Account created successfully!"),
    )),
    Err(CoreError::Invalid(errors)) => {
      let body = pages::register(form.username.trim(), &errors);
      Ok(super::render(&state, &flash, None, "Register", &body))
    }
    Err(e) => Err(e.into()),
  }
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
  next: Option<String>,
}

pub async fn login_form<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  flash: Flash,
  Query(query): Query<NextQuery>,
) -> Response {
  if user.identity.is_some() {
    return session::redirect(DASHBOARD_PATH);
  }
  let body = pages::login("", query.next.as_deref(), &FieldErrors::new());
  super::render(&state, &flash, None, "Log in", &body)
}

pub async fn login<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  flash: Flash,
  Form(form): Form<LoginForm>,
) -> Result<Response, Error> {
  if user.identity.is_some() {
    return Ok(session::redirect(DASHBOARD_PATH));
  }

  let retry = |errors: &FieldErrors| {
    let body = pages::login(form.username.trim(), form.next.as_deref(), errors);
    super::render(&state, &flash, None, "Log in", &body)
  };

  if let Err(errors) = form.validate() {
    return Ok(retry(&errors));
  }

  let Some(identity) = state
    .gateway
    .authenticate(&form.username, &form.password)
    .await?
  else {
    tracing::warn!(username = %form.username.trim(), "failed login");
    let mut errors = FieldErrors::new();
    errors.add_general(BAD_LOGIN);
    return Ok(retry(&errors));
  };

  // A stale token from an earlier session is dropped rather than reused.
  if let Some(old) = &user.token {
    state.gateway.clear_session(old).await?;
  }
  let token = state.gateway.establish_session(&identity).await?;

  let to = form
    .next
    .as_deref()
    .filter(|n| pages::is_resumable(n))
    .unwrap_or(DASHBOARD_PATH);
  let mut res = session::redirect(to);
  session::set_cookie(&mut res, state.cookies().session(&token));
  Ok(res)
}

// ─── Logout ──────────────────────────────────────────────────────────────────

pub async fn logout<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<Response, Error> {
  let identity = user.require()?;
  if let Some(token) = &user.token {
    state.gateway.clear_session(token).await?;
  }
  tracing::info!(username = %identity.username, "logged out");

  let cookies = state.cookies();
  let mut res = session::redirect_with_flash(
    &cookies,
    LOGIN_PATH,
    FlashMessage::success("Logout success!"),
  );
  session::set_cookie(&mut res, cookies.clear_session());
  Ok(res)
}
