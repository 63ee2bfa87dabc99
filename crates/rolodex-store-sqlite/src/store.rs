//! [`SqliteStore`]: the SQLite implementation of [`ClientStore`] and
//! [`AccountStore`].

use std::path::Path;

use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use rolodex_core::{
  account::User,
  client::{Client, ClientFields, ClientId},
  store::{AccountStore, ClientStore, Credentials, NewSession},
};

use crate::{
  Error, Result,
  encode::{
    CLIENT_COLUMNS, RawClient, RawUser, decode_dt, encode_dt, encode_uuid, now,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Rolodex store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Carry a decode failure out of a `call` closure.
fn other(e: Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

// ─── ClientStore impl ────────────────────────────────────────────────────────

impl ClientStore for SqliteStore {
  type Error = Error;

  async fn insert_client(&self, owner: Uuid, fields: ClientFields) -> Result<Client> {
    let created_at = now();
    let owner_str  = encode_uuid(owner);
    let at_str     = encode_dt(created_at);
    let row        = fields.clone();

    let client_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO clients (
             owner_id, first_name, last_name, email, phone,
             street, city, province, country, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
          rusqlite::params![
            owner_str,
            row.first_name,
            row.last_name,
            row.email,
            row.phone,
            row.street,
            row.city,
            row.province,
            row.country,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Client {
      client_id,
      owner,
      fields,
      created_at,
      updated_at: created_at,
    })
  }

  async fn get_client(&self, id: ClientId) -> Result<Option<Client>> {
    let raw: Option<RawClient> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE client_id = ?1"),
            rusqlite::params![id],
            RawClient::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawClient::into_client).transpose()
  }

  async fn list_clients(&self, owner: Uuid) -> Result<Vec<Client>> {
    let owner_str = encode_uuid(owner);

    let raws: Vec<RawClient> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CLIENT_COLUMNS} FROM clients
           WHERE owner_id = ?1
           ORDER BY client_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], RawClient::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawClient::into_client).collect()
  }

  async fn update_client(
    &self,
    id:     ClientId,
    owner:  Uuid,
    fields: ClientFields,
  ) -> Result<Option<Client>> {
    let owner_str = encode_uuid(owner);
    let candidate = now();

    // Read-compute-write of `updated_at` happens in one transaction so it
    // stays strictly increasing under concurrent updates.
    let raw: Option<RawClient> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let previous: Option<String> = tx
          .query_row(
            "SELECT updated_at FROM clients WHERE client_id = ?1",
            rusqlite::params![id],
            |r| r.get(0),
          )
          .optional()?;
        let Some(previous) = previous else {
          return Ok(None);
        };

        let previous = decode_dt(&previous).map_err(other)?;
        let updated_at =
          candidate.max(previous + TimeDelta::microseconds(1));

        tx.execute(
          "UPDATE clients SET
             owner_id = ?2, first_name = ?3, last_name = ?4, email = ?5,
             phone = ?6, street = ?7, city = ?8, province = ?9,
             country = ?10, updated_at = ?11
           WHERE client_id = ?1",
          rusqlite::params![
            id,
            owner_str,
            fields.first_name,
            fields.last_name,
            fields.email,
            fields.phone,
            fields.street,
            fields.city,
            fields.province,
            fields.country,
            encode_dt(updated_at),
          ],
        )?;

        let raw = tx.query_row(
          &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE client_id = ?1"),
          rusqlite::params![id],
          RawClient::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawClient::into_client).transpose()
  }

  async fn delete_client(&self, id: ClientId, owner: Uuid) -> Result<bool> {
    let owner_str = encode_uuid(owner);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM clients WHERE client_id = ?1 AND owner_id = ?2",
          rusqlite::params![id, owner_str],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }
}

// ─── AccountStore impl ───────────────────────────────────────────────────────

impl AccountStore for SqliteStore {
  type Error = Error;

  async fn insert_user(
    &self,
    username:      String,
    password_hash: String,
  ) -> Result<Option<User>> {
    let user = User {
      user_id:    Uuid::new_v4(),
      username,
      created_at: now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let name_str = user.username.clone();
    let at_str   = encode_dt(user.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO users (user_id, username, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name_str, password_hash, at_str],
        )?)
      })
      .await?;

    Ok((inserted > 0).then_some(user))
  }

  async fn find_credentials(&self, username: String) -> Result<Option<Credentials>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, username, created_at, password_hash
             FROM users WHERE username = ?1",
            rusqlite::params![username],
            |row| {
              Ok(RawUser {
                user_id:       row.get(0)?,
                username:      row.get(1)?,
                created_at:    row.get(2)?,
                password_hash: row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    let Some(mut raw) = raw else { return Ok(None) };
    let password_hash = raw.password_hash.take().unwrap_or_default();
    Ok(Some(Credentials { user: raw.into_user()?, password_hash }))
  }

  async fn insert_session(&self, session: NewSession) -> Result<()> {
    let user_str    = encode_uuid(session.user_id);
    let created_str = encode_dt(now());
    let expires_str = encode_dt(session.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![session.token_hash, user_str, created_str, expires_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn session_user(
    &self,
    token_hash: String,
    at:         DateTime<Utc>,
  ) -> Result<Option<User>> {
    let at_str = encode_dt(at);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT u.user_id, u.username, u.created_at
             FROM sessions s
             JOIN users u ON u.user_id = s.user_id
             WHERE s.token_hash = ?1
               AND s.expires_at > ?2",
            rusqlite::params![token_hash, at_str],
            |row| {
              Ok(RawUser {
                user_id:       row.get(0)?,
                username:      row.get(1)?,
                created_at:    row.get(2)?,
                password_hash: None,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn delete_session(&self, token_hash: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM sessions WHERE token_hash = ?1",
          rusqlite::params![token_hash],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn purge_expired_sessions(&self, at: DateTime<Utc>) -> Result<usize> {
    let at_str = encode_dt(at);

    let purged = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM sessions WHERE expires_at <= ?1",
          rusqlite::params![at_str],
        )?)
      })
      .await?;
    Ok(purged)
  }
}
