//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{TimeDelta, Utc};
use rolodex_core::{
  account::User,
  client::ClientFields,
  store::{AccountStore, ClientStore, NewSession},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, name: &str) -> User {
  s.insert_user(name.into(), "$argon2id$placeholder".into())
    .await
    .unwrap()
    .expect("fresh username")
}

fn fields(first: &str) -> ClientFields {
  ClientFields {
    first_name: first.into(),
    last_name:  "Liddell".into(),
    email:      format!("{}@example.com", first.to_lowercase()),
    phone:      "+1 555 0100".into(),
    street:     "7 Rabbit Hole".into(),
    city:       "Oxford".into(),
    province:   "Oxfordshire".into(),
    country:    "England".into(),
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_find_user() {
  let s = store().await;
  let created = user(&s, "alice").await;

  let creds = s.find_credentials("alice".into()).await.unwrap().unwrap();
  assert_eq!(creds.user, created);
  assert_eq!(creds.password_hash, "$argon2id$placeholder");
}

#[tokio::test]
async fn duplicate_username_returns_none() {
  let s = store().await;
  user(&s, "alice").await;

  let dup = s.insert_user("alice".into(), "x".into()).await.unwrap();
  assert!(dup.is_none());

  // Usernames are case-sensitive.
  let other = s.insert_user("Alice".into(), "x".into()).await.unwrap();
  assert!(other.is_some());
}

#[tokio::test]
async fn find_unknown_user_returns_none() {
  let s = store().await;
  assert!(s.find_credentials("nobody".into()).await.unwrap().is_none());
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn session_resolves_until_expiry() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let now = Utc::now();

  s.insert_session(NewSession {
    token_hash: "abc".into(),
    user_id:    alice.user_id,
    expires_at: now + TimeDelta::hours(1),
  })
  .await
  .unwrap();

  let found = s.session_user("abc".into(), now).await.unwrap();
  assert_eq!(found, Some(alice));

  let later = now + TimeDelta::hours(2);
  assert!(s.session_user("abc".into(), later).await.unwrap().is_none());
  assert!(s.session_user("nope".into(), now).await.unwrap().is_none());
}

#[tokio::test]
async fn deleted_session_no_longer_resolves() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let now = Utc::now();

  s.insert_session(NewSession {
    token_hash: "abc".into(),
    user_id:    alice.user_id,
    expires_at: now + TimeDelta::hours(1),
  })
  .await
  .unwrap();

  s.delete_session("abc".into()).await.unwrap();
  assert!(s.session_user("abc".into(), now).await.unwrap().is_none());

  // Deleting again is not an error.
  s.delete_session("abc".into()).await.unwrap();
}

#[tokio::test]
async fn purge_removes_only_expired_sessions() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let now = Utc::now();

  for (hash, offset) in [("old", -1), ("new", 1)] {
    s.insert_session(NewSession {
      token_hash: hash.into(),
      user_id:    alice.user_id,
      expires_at: now + TimeDelta::hours(offset),
    })
    .await
    .unwrap();
  }

  assert_eq!(s.purge_expired_sessions(now).await.unwrap(), 1);
  assert!(s.session_user("new".into(), now).await.unwrap().is_some());
}

// ─── Clients ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_client() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let client = s.insert_client(alice.user_id, fields("Alice")).await.unwrap();
  assert_eq!(client.owner, alice.user_id);
  assert_eq!(client.created_at, client.updated_at);

  let fetched = s.get_client(client.client_id).await.unwrap();
  assert_eq!(fetched, Some(client));
}

#[tokio::test]
async fn get_client_missing_returns_none() {
  let s = store().await;
  assert!(s.get_client(999).await.unwrap().is_none());
}

#[tokio::test]
async fn list_clients_is_owner_scoped_and_ordered() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let a1 = s.insert_client(alice.user_id, fields("One")).await.unwrap();
  s.insert_client(bob.user_id, fields("Bob")).await.unwrap();
  let a2 = s.insert_client(alice.user_id, fields("Two")).await.unwrap();

  let listed = s.list_clients(alice.user_id).await.unwrap();
  assert_eq!(listed, vec![a1, a2]);
  assert!(s.list_clients(Uuid::new_v4()).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_overwrites_fields_and_owner() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let original = s.insert_client(alice.user_id, fields("Alice")).await.unwrap();

  let mut changed = fields("Alice");
  changed.city = "London".into();
  let updated = s
    .update_client(original.client_id, bob.user_id, changed)
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.owner, bob.user_id);
  assert_eq!(updated.fields.city, "London");
  assert_eq!(updated.created_at, original.created_at);
  assert!(updated.updated_at > original.updated_at);
  assert_eq!(s.get_client(original.client_id).await.unwrap(), Some(updated));
}

#[tokio::test]
async fn back_to_back_updates_strictly_increase_updated_at() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let client = s.insert_client(alice.user_id, fields("Alice")).await.unwrap();

  let mut last = client.updated_at;
  for _ in 0..5 {
    let next = s
      .update_client(client.client_id, alice.user_id, fields("Alice"))
      .await
      .unwrap()
      .unwrap();
    assert!(next.updated_at > last);
    last = next.updated_at;
  }
}

#[tokio::test]
async fn update_missing_client_returns_none() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let result = s.update_client(5, alice.user_id, fields("X")).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn delete_removes_exactly_one_client() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let doomed = s.insert_client(alice.user_id, fields("One")).await.unwrap();
  let kept = s.insert_client(alice.user_id, fields("Two")).await.unwrap();

  assert!(s.delete_client(doomed.client_id, alice.user_id).await.unwrap());
  assert!(!s.delete_client(doomed.client_id, alice.user_id).await.unwrap());
  assert_eq!(s.list_clients(alice.user_id).await.unwrap(), vec![kept]);
}

#[tokio::test]
async fn delete_only_matches_the_current_owner() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let client = s.insert_client(alice.user_id, fields("Alice")).await.unwrap();

  // Reassigned to bob after alice last looked at it.
  s.update_client(client.client_id, bob.user_id, fields("Alice"))
    .await
    .unwrap();

  assert!(!s.delete_client(client.client_id, alice.user_id).await.unwrap());
  assert!(s.get_client(client.client_id).await.unwrap().is_some());
  assert!(s.delete_client(client.client_id, bob.user_id).await.unwrap());
}

#[tokio::test]
async fn deleted_ids_are_not_reused() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let first = s.insert_client(alice.user_id, fields("One")).await.unwrap();
  s.delete_client(first.client_id, alice.user_id).await.unwrap();

  let second = s.insert_client(alice.user_id, fields("Two")).await.unwrap();
  assert!(second.client_id > first.client_id);
}
