//! The client registry: ownership-scoped operations on client records.
//!
//! Every operation is a single transition that receives the caller's identity
//! explicitly. `None` means the request is anonymous and yields
//! [`Error::AuthRequired`] before anything else happens. Validation runs as a
//! pure step ahead of any store call, so a rejected form never mutates state.

use crate::{
  Error, Result,
  account::Identity,
  client::{Client, ClientForm, ClientId},
  policy::OwnershipPolicy,
  store::ClientStore,
};

/// Borrowed view over a [`ClientStore`] with the ownership rules applied.
pub struct Registry<'s, S> {
  store:  &'s S,
  policy: OwnershipPolicy,
}

impl<'s, S: ClientStore> Registry<'s, S> {
  pub fn new(store: &'s S, policy: OwnershipPolicy) -> Self {
    Self { store, policy }
  }

  /// Clients owned by `who`, in insertion order.
  pub async fn list(&self, who: Option<&Identity>) -> Result<Vec<Client>> {
    let who = signed_in(who)?;
    self.store.list_clients(who.user_id).await.map_err(Error::store)
  }

  /// Validate `form` and persist a new client owned by `who`.
  pub async fn create(
    &self,
    who: Option<&Identity>,
    form: &ClientForm,
  ) -> Result<Client> {
    let who = signed_in(who)?;
    let fields = form.validate().map_err(Error::Invalid)?;
    self
      .store
      .insert_client(who.user_id, fields)
      .await
      .map_err(Error::store)
  }

  /// Look up one client by id.
  pub async fn read(&self, who: Option<&Identity>, id: ClientId) -> Result<Client> {
    let who = signed_in(who)?;
    let client = self.load(id).await?;
    if self.policy.restrict_reads && !client.is_owned_by(who.user_id) {
      return Err(Error::Forbidden(id));
    }
    Ok(client)
  }

  /// Validate `form` and overwrite client `id` with it.
  ///
  /// The owner is re-stamped to `who` unless the policy preserves owners, in
  /// which case a non-owner is refused.
  pub async fn update(
    &self,
    who: Option<&Identity>,
    id: ClientId,
    form: &ClientForm,
  ) -> Result<Client> {
    let who = signed_in(who)?;
    let existing = self.load(id).await?;
    if self.policy.preserve_owner_on_update && !existing.is_owned_by(who.user_id)
    {
      return Err(Error::Forbidden(id));
    }

    let fields = form.validate().map_err(Error::Invalid)?;
    self
      .store
      .update_client(id, who.user_id, fields)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(id))
  }

  /// Delete client `id` if `who` owns it. Returns the removed record.
  pub async fn delete(&self, who: Option<&Identity>, id: ClientId) -> Result<Client> {
    let who = signed_in(who)?;
    let client = self.load(id).await?;
    if !client.is_owned_by(who.user_id) {
      return Err(Error::Forbidden(id));
    }

    let removed = self
      .store
      .delete_client(id, who.user_id)
      .await
      .map_err(Error::store)?;
    if !removed {
      // Reassigned or removed since it was loaded.
      self.load(id).await?;
      return Err(Error::Forbidden(id));
    }
    Ok(client)
  }

  async fn load(&self, id: ClientId) -> Result<Client> {
    self
      .store
      .get_client(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(id))
  }
}

fn signed_in(who: Option<&Identity>) -> Result<&Identity> {
  who.ok_or(Error::AuthRequired)
}
