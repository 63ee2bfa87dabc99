//! Field-level validation primitives shared by every form.
//!
//! Validation is a pure step: raw form input goes in, either a validated
//! value or a [`FieldErrors`] collection comes out. Nothing here touches a
//! store.

use std::{collections::BTreeMap, fmt};

/// Key used for errors that are not attached to a single field.
pub const NON_FIELD: &str = "__all__";

pub const REQUIRED: &str = "This field is required.";

/// Per-field error messages, keyed by the form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
  errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
  pub fn new() -> Self { Self::default() }

  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self
      .errors
      .entry(field.to_owned())
      .or_default()
      .push(message.into());
  }

  /// Add an error that belongs to the form as a whole.
  pub fn add_general(&mut self, message: impl Into<String>) {
    self.add(NON_FIELD, message);
  }

  pub fn is_empty(&self) -> bool { self.errors.is_empty() }

  /// Messages for `field`, in the order they were added.
  pub fn get(&self, field: &str) -> &[String] {
    self.errors.get(field).map(Vec::as_slice).unwrap_or_default()
  }

  pub fn general(&self) -> &[String] { self.get(NON_FIELD) }

  pub fn has(&self, field: &str) -> bool { self.errors.contains_key(field) }

  /// Names of all fields carrying at least one error.
  pub fn fields(&self) -> impl Iterator<Item = &str> {
    self.errors.keys().map(String::as_str)
  }

  /// `Ok(value)` if no errors were collected, otherwise `Err(self)`.
  pub fn into_result<T>(self, value: T) -> Result<T, Self> {
    if self.is_empty() { Ok(value) } else { Err(self) }
  }
}

impl fmt::Display for FieldErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, messages) in &self.errors {
      for message in messages {
        if !first {
          f.write_str("; ")?;
        }
        first = false;
        write!(f, "{field}: {message}")?;
      }
    }
    Ok(())
  }
}

/// Trim `raw` and check it is present and at most `max_len` characters.
///
/// Returns the trimmed value; on failure the error is recorded against
/// `field` and the trimmed value is still returned so callers can keep
/// collecting errors for the remaining fields.
pub fn required_text(
  errors: &mut FieldErrors,
  field: &str,
  raw: &str,
  max_len: usize,
) -> String {
  let value = raw.trim();
  if value.is_empty() {
    errors.add(field, REQUIRED);
  } else {
    check_max_length(errors, field, value, max_len);
  }
  value.to_owned()
}

/// Record an error against `field` if `value` is longer than `max_len`
/// characters.
pub fn check_max_length(
  errors: &mut FieldErrors,
  field: &str,
  value: &str,
  max_len: usize,
) {
  let len = value.chars().count();
  if len > max_len {
    errors.add(
      field,
      format!(
        "Ensure this value has at most {max_len} characters (it has {len})."
      ),
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn required_text_trims_and_flags_blank() {
    let mut errors = FieldErrors::new();
    assert_eq!(required_text(&mut errors, "city", "  Oslo ", 10), "Oslo");
    assert!(errors.is_empty());

    required_text(&mut errors, "city", "   ", 10);
    assert_eq!(errors.get("city"), [REQUIRED]);
  }

  #[test]
  fn max_length_counts_characters_not_bytes() {
    let mut errors = FieldErrors::new();
    check_max_length(&mut errors, "city", "Zürich", 6);
    assert!(errors.is_empty());

    check_max_length(&mut errors, "city", "Zürichs", 6);
    assert_eq!(
      errors.get("city"),
      ["Ensure this value has at most 6 characters (it has 7)."]
    );
  }

  #[test]
  fn display_joins_all_messages() {
    let mut errors = FieldErrors::new();
    errors.add("phone", REQUIRED);
    errors.add_general("Nope.");
    assert_eq!(
      errors.to_string(),
      "__all__: Nope.; phone: This field is required."
    );
  }
}
