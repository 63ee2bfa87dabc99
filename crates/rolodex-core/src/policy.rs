//! Ownership rules applied by the [`Registry`](crate::registry::Registry).
//!
//! Listing and deleting are always scoped to the record owner. Reading one
//! record and updating it are open to any signed-in user unless tightened
//! here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnershipPolicy {
  /// Only the owner may view a client's details.
  pub restrict_reads:           bool,
  /// Only the owner may update a client, and the owner never changes. When
  /// unset, an update re-stamps the owner to whoever submitted it.
  pub preserve_owner_on_update: bool,
}

impl OwnershipPolicy {
  /// Both checks enabled.
  pub fn strict() -> Self {
    Self { restrict_reads: true, preserve_owner_on_update: true }
  }
}
