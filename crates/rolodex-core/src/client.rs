//! Client: one contact record owned by a single user.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validate::{FieldErrors, required_text};

/// Store-assigned client identifier; increases with every insert.
pub type ClientId = i64;

// ─── Field table ─────────────────────────────────────────────────────────────

/// A client form field: its form name, human label and length bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
  pub name:    &'static str,
  pub label:   &'static str,
  pub max_len: usize,
}

/// All client fields, in display order.
pub const CLIENT_FIELDS: [FieldSpec; 8] = [
  FieldSpec { name: "first_name", label: "First name", max_len: 150 },
  FieldSpec { name: "last_name",  label: "Last name",  max_len: 150 },
  FieldSpec { name: "email",      label: "Email",      max_len: 300 },
  FieldSpec { name: "phone",      label: "Phone",      max_len: 20 },
  FieldSpec { name: "street",     label: "Street",     max_len: 300 },
  FieldSpec { name: "city",       label: "City",       max_len: 255 },
  FieldSpec { name: "province",   label: "Province",   max_len: 200 },
  FieldSpec { name: "country",    label: "Country",    max_len: 100 },
];

// ─── Validated fields ────────────────────────────────────────────────────────

/// Client attributes that have passed [`ClientForm::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFields {
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub phone:      String,
  pub street:     String,
  pub city:       String,
  pub province:   String,
  pub country:    String,
}

impl ClientFields {
  /// Field values in [`CLIENT_FIELDS`] order.
  pub fn values(&self) -> [&str; 8] {
    [
      &self.first_name,
      &self.last_name,
      &self.email,
      &self.phone,
      &self.street,
      &self.city,
      &self.province,
      &self.country,
    ]
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// A persisted client record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
  pub client_id:  ClientId,
  /// The user this record is scoped to.
  pub owner:      Uuid,
  pub fields:     ClientFields,
  /// Set once by the store at insert time.
  pub created_at: DateTime<Utc>,
  /// Refreshed by the store on every update; strictly increasing.
  pub updated_at: DateTime<Utc>,
}

impl Client {
  pub fn is_owned_by(&self, user_id: Uuid) -> bool { self.owner == user_id }
}

impl fmt::Display for Client {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.fields.first_name, self.fields.last_name)
  }
}

// ─── Form ────────────────────────────────────────────────────────────────────

/// Raw, unvalidated client input as submitted by the add/update forms.
///
/// Missing form keys deserialise to empty strings so that validation, not the
/// extractor, reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientForm {
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub phone:      String,
  pub street:     String,
  pub city:       String,
  pub province:   String,
  pub country:    String,
}

impl ClientForm {
  /// Validate every field, collecting all errors rather than stopping at the
  /// first one.
  pub fn validate(&self) -> Result<ClientFields, FieldErrors> {
    let mut errors = FieldErrors::new();
    let [first_name, last_name, email, phone, street, city, province, country] =
      CLIENT_FIELDS.map(|spec| {
        required_text(&mut errors, spec.name, self.value(spec.name), spec.max_len)
      });

    errors.into_result(ClientFields {
      first_name,
      last_name,
      email,
      phone,
      street,
      city,
      province,
      country,
    })
  }

  /// Raw value of the field called `name`; unknown names read as empty.
  pub fn value(&self, name: &str) -> &str {
    match name {
      "first_name" => &self.first_name,
      "last_name" => &self.last_name,
      "email" => &self.email,
      "phone" => &self.phone,
      "street" => &self.street,
      "city" => &self.city,
      "province" => &self.province,
      "country" => &self.country,
      _ => "",
    }
  }
}

impl From<&ClientFields> for ClientForm {
  fn from(f: &ClientFields) -> Self {
    Self {
      first_name: f.first_name.clone(),
      last_name:  f.last_name.clone(),
      email:      f.email.clone(),
      phone:      f.phone.clone(),
      street:     f.street.clone(),
      city:       f.city.clone(),
      province:   f.province.clone(),
      country:    f.country.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::validate::REQUIRED;

  fn ada() -> ClientForm {
    ClientForm {
      first_name: "Ada".into(),
      last_name:  "Lovelace".into(),
      email:      "ada@example.com".into(),
      phone:      "+44 20 7946 0000".into(),
      street:     "12 St James's Square".into(),
      city:       "London".into(),
      province:   "Greater London".into(),
      country:    "United Kingdom".into(),
    }
  }

  #[test]
  fn valid_form_trims_values() {
    let mut form = ada();
    form.city = "  London  ".into();
    let fields = form.validate().unwrap();
    assert_eq!(fields.city, "London");
    assert_eq!(fields.first_name, "Ada");
  }

  #[test]
  fn every_missing_field_is_reported() {
    let errors = ClientForm::default().validate().unwrap_err();
    for spec in CLIENT_FIELDS {
      assert_eq!(errors.get(spec.name), [REQUIRED], "field {}", spec.name);
    }
  }

  #[test]
  fn phone_longer_than_twenty_characters_is_rejected() {
    let mut form = ada();
    form.phone = "1".repeat(21);
    let errors = form.validate().unwrap_err();
    assert_eq!(errors.fields().collect::<Vec<_>>(), ["phone"]);
  }

  #[test]
  fn form_round_trips_through_fields() {
    let fields = ada().validate().unwrap();
    assert_eq!(ClientForm::from(&fields), ada());
  }
}
