pub mod account;
pub mod clients;
pub mod home;

use axum::{http::StatusCode, response::Response};
use rolodex_core::account::Identity;

use crate::{
  AppState, Backend, pages,
  session::{self, Flash},
};

/// A `200 OK` page wrapped in the site layout.
pub(super) fn render<S: Backend>(
  state: &AppState<S>,
  flash: &Flash,
  who: Option<&Identity>,
  title: &str,
  body: &str,
) -> Response {
  let html = pages::layout(title, who, flash.0.as_ref(), body);
  session::page(&state.cookies(), StatusCode::OK, flash, html)
}
