//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings with microsecond
//! precision, so lexicographic order in SQL equals chronological order. UUIDs
//! are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rolodex_core::{
  account::User,
  client::{Client, ClientFields},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// The current instant at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Raw rows ─────────────────────────────────────────────────────────────────

pub const CLIENT_COLUMNS: &str = "client_id, owner_id, first_name, last_name, \
  email, phone, street, city, province, country, created_at, updated_at";

/// A `clients` row exactly as read from SQLite.
pub struct RawClient {
  pub client_id:  i64,
  pub owner_id:   String,
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub phone:      String,
  pub street:     String,
  pub city:       String,
  pub province:   String,
  pub country:    String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawClient {
  /// Map a row selected with [`CLIENT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      client_id:  row.get(0)?,
      owner_id:   row.get(1)?,
      first_name: row.get(2)?,
      last_name:  row.get(3)?,
      email:      row.get(4)?,
      phone:      row.get(5)?,
      street:     row.get(6)?,
      city:       row.get(7)?,
      province:   row.get(8)?,
      country:    row.get(9)?,
      created_at: row.get(10)?,
      updated_at: row.get(11)?,
    })
  }

  pub fn into_client(self) -> Result<Client> {
    Ok(Client {
      client_id:  self.client_id,
      owner:      decode_uuid(&self.owner_id)?,
      fields:     ClientFields {
        first_name: self.first_name,
        last_name:  self.last_name,
        email:      self.email,
        phone:      self.phone,
        street:     self.street,
        city:       self.city,
        province:   self.province,
        country:    self.country,
      },
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// A `users` row, optionally with its password hash.
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub created_at:    String,
  pub password_hash: Option<String>,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      username:   self.username,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let whole = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let later = whole + chrono::TimeDelta::microseconds(1);
    assert!(encode_dt(whole) < encode_dt(later));
    assert_eq!(encode_dt(whole), "2024-05-01T12:00:00.000000Z");
  }

  #[test]
  fn now_survives_a_round_trip() {
    let t = now();
    assert_eq!(decode_dt(&encode_dt(t)).unwrap(), t);
  }
}
