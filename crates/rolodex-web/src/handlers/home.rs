//! `/`: the landing page.

use axum::{extract::State, response::Response};

use crate::{AppState, Backend, auth::CurrentUser, pages, session::Flash};

pub async fn show<S: Backend>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  flash: Flash,
) -> Response {
  super::render(&state, &flash, user.identity(), "Home", &pages::home(user.identity()))
}
