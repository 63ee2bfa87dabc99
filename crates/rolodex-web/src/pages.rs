//! Server-rendered HTML.
//!
//! One layout and a handful of pages. Every interpolated value goes through
//! [`escape`].

use std::fmt::Write as _;

use rolodex_core::{
  account::Identity,
  client::{CLIENT_FIELDS, Client, ClientForm},
  validate::FieldErrors,
};

use crate::session::{FlashMessage, Level};

pub const LOGIN_PATH: &str = "/user-login";
pub const DASHBOARD_PATH: &str = "/client-dashboard";
pub const LOGOUT_PATH: &str = "/user-logout";

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#x27;"),
      _ => out.push(c),
    }
  }
  out
}

/// The login page URL, remembering where to go afterwards.
pub fn login_url(next: Option<&str>) -> String {
  match next.filter(|n| is_resumable(n)) {
    Some(next) => format!("{LOGIN_PATH}?next={}", urlencoding::encode(next)),
    None => LOGIN_PATH.to_owned(),
  }
}

/// Only same-site absolute paths made of visible ASCII are accepted as
/// post-login destinations.
pub fn is_local_path(path: &str) -> bool {
  path.starts_with('/')
    && !path.starts_with("//")
    && !path.starts_with("/\\")
    && path.bytes().all(|b| b.is_ascii_graphic())
}

/// Whether the user may be sent straight to `path` after logging in.
/// Paths that change state on GET are never replayed.
pub fn is_resumable(path: &str) -> bool {
  is_local_path(path)
    && !path.starts_with("/delete-client/")
    && path != LOGOUT_PATH
}

fn errors_list(messages: &[String]) -> String {
  if messages.is_empty() {
    return String::new();
  }
  let mut html = String::from("<ul class=\"errors\">");
  for m in messages {
    let _ = write!(html, "<li>{}</li>", escape(m));
  }
  html.push_str("</ul>");
  html
}

fn input(name: &str, label: &str, kind: &str, value: &str, errors: &FieldErrors) -> String {
  format!(
    "<p><label for=\"{name}\">{label}</label>\
     <input id=\"{name}\" name=\"{name}\" type=\"{kind}\" value=\"{value}\">{errs}</p>",
    label = escape(label),
    value = escape(value),
    errs = errors_list(errors.get(name)),
  )
}

// ─── Layout ──────────────────────────────────────────────────────────────────

pub fn layout(
  title: &str,
  who: Option<&Identity>,
  flash: Option<&FlashMessage>,
  body: &str,
) -> String {
  let nav = match who {
    Some(id) => format!(
      "<a href=\"{DASHBOARD_PATH}\">Dashboard</a> \
       <a href=\"/add-client\">Add client</a> \
       <span>Signed in as {}</span> \
       <a href=\"{LOGOUT_PATH}\">Log out</a>",
      escape(&id.username)
    ),
    None => format!(
      "<a href=\"/register\">Register</a> <a href=\"{LOGIN_PATH}\">Log in</a>"
    ),
  };
  let flash = flash
    .map(|f| {
      let class = match f.level {
        Level::Success => "success",
        Level::Error => "error",
      };
      format!("<div class=\"flash {class}\">{}</div>", escape(&f.message))
    })
    .unwrap_or_default();

  format!(
    "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\
     <title>{title} | Rolodex</title></head>\
     <body><nav><a href=\"/\">Rolodex</a> {nav}</nav>{flash}<main>{body}</main></body></html>",
    title = escape(title),
  )
}

// ─── Pages ───────────────────────────────────────────────────────────────────

pub fn home(who: Option<&Identity>) -> String {
  match who {
    Some(id) => format!(
      "<h1>Welcome back, {}</h1><p><a href=\"{DASHBOARD_PATH}\">Go to your clients</a></p>",
      escape(&id.username)
    ),
    None => "<h1>Rolodex</h1><p>Keep track of your clients. \
             <a href=\"/register\">Create an account</a> or \
             <a href=\"/user-login\">log in</a>.</p>"
      .to_owned(),
  }
}

pub fn register(username: &str, errors: &FieldErrors) -> String {
  format!(
    "<h1>Register</h1><form method=\"post\" action=\"/register\">{general}{u}{p1}{p2}\
     <button type=\"submit\">Register</button></form>",
    general = errors_list(errors.general()),
    u = input("username", "Username", "text", username, errors),
    p1 = input("password1", "Password", "password", "", errors),
    p2 = input("password2", "Password confirmation", "password", "", errors),
  )
}

pub fn login(username: &str, next: Option<&str>, errors: &FieldErrors) -> String {
  let next = next
    .filter(|n| is_resumable(n))
    .map(|n| format!("<input type=\"hidden\" name=\"next\" value=\"{}\">", escape(n)))
    .unwrap_or_default();
  format!(
    "<h1>Log in</h1><form method=\"post\" action=\"{LOGIN_PATH}\">{general}{u}{p}{next}\
     <button type=\"submit\">Log in</button></form>",
    general = errors_list(errors.general()),
    u = input("username", "Username", "text", username, errors),
    p = input("password", "Password", "password", "", errors),
  )
}

pub fn dashboard(clients: &[Client]) -> String {
  if clients.is_empty() {
    return "<h1>Your clients</h1><p>No clients yet. \
            <a href=\"/add-client\">Add one</a>.</p>"
      .to_owned();
  }
  let mut rows = String::new();
  for c in clients {
    let _ = write!(
      rows,
      "<tr><td><a href=\"/client-details/{id}\">{name}</a></td><td>{email}</td>\
       <td>{phone}</td><td>{city}</td><td>{country}</td><td>{created}</td></tr>",
      id = c.client_id,
      name = escape(&c.to_string()),
      email = escape(&c.fields.email),
      phone = escape(&c.fields.phone),
      city = escape(&c.fields.city),
      country = escape(&c.fields.country),
      created = c.created_at.format("%Y-%m-%d %H:%M"),
    );
  }
  format!(
    "<h1>Your clients</h1><table><thead><tr><th>Name</th><th>Email</th>\
     <th>Phone</th><th>City</th><th>Country</th><th>Created</th></tr></thead>\
     <tbody>{rows}</tbody></table>"
  )
}

/// The add/update form. `action` is the path the form posts to.
pub fn client_form(heading: &str, action: &str, form: &ClientForm, errors: &FieldErrors) -> String {
  let mut fields = String::new();
  for spec in CLIENT_FIELDS {
    fields.push_str(&input(spec.name, spec.label, "text", form.value(spec.name), errors));
  }
  format!(
    "<h1>{heading}</h1><form method=\"post\" action=\"{action}\">{general}{fields}\
     <button type=\"submit\">Save</button></form>",
    heading = escape(heading),
    general = errors_list(errors.general()),
  )
}

pub fn client_detail(client: &Client) -> String {
  let mut rows = String::new();
  for (spec, value) in CLIENT_FIELDS.iter().zip(client.fields.values()) {
    let _ = write!(rows, "<tr><th>{}</th><td>{}</td></tr>", escape(spec.label), escape(value));
  }
  let id = client.client_id;
  format!(
    "<h1>{name}</h1><table>{rows}\
     <tr><th>Created</th><td>{created}</td></tr>\
     <tr><th>Updated</th><td>{updated}</td></tr></table>\
     <p><a href=\"/update-client/{id}\">Edit</a></p>\
     <form method=\"post\" action=\"/delete-client/{id}\">\
     <button type=\"submit\">Delete</button></form>",
    name = escape(&client.to_string()),
    created = client.created_at.format("%Y-%m-%d %H:%M:%S"),
    updated = client.updated_at.format("%Y-%m-%d %H:%M:%S"),
  )
}

pub fn not_found() -> String {
  layout("Not found", None, None, "<h1>Not found</h1><p>No such client.</p>")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn escape_neutralises_markup() {
    assert_eq!(
      escape("<script>alert('x') & \"y\"</script>"),
      "&lt;script&gt;alert(&#x27;x&#x27;) &amp; &quot;y&quot;&lt;/script&gt;"
    );
  }

  #[test]
  fn login_url_keeps_local_next_only() {
    assert_eq!(login_url(None), "/user-login");
    assert_eq!(
      login_url(Some("/update-client/3")),
      "/user-login?next=%2Fupdate-client%2F3"
    );
    assert_eq!(login_url(Some("/a&b")), "/user-login?next=%2Fa%26b");
    assert_eq!(login_url(Some("//evil.example")), "/user-login");
    assert_eq!(login_url(Some("https://evil.example")), "/user-login");
  }

  #[test]
  fn state_changing_paths_are_not_resumed() {
    assert_eq!(login_url(Some("/delete-client/5")), "/user-login");
    assert_eq!(login_url(Some("/user-logout")), "/user-login");
    let none = FieldErrors::new();
    assert!(!login("", Some("/delete-client/5"), &none).contains("name=\"next\""));
    assert!(login("", Some("/add-client"), &none).contains("name=\"next\""));
  }

  #[test]
  fn client_form_shows_submitted_values_and_errors() {
    let form = ClientForm { first_name: "<Ada>".into(), ..Default::default() };
    let errors = form.validate().unwrap_err();
    let html = client_form("Add client", "/add-client", &form, &errors);
    assert!(html.contains("value=\"&lt;Ada&gt;\""));
    assert!(html.contains("This field is required."));
  }
}
