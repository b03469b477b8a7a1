use serde::{Deserialize, Serialize};

use crate::Ownership;

/// Client id of the system tenant.
pub const SYSTEM_CLIENT_ID: i64 = 0;

/// Highest client id reserved for system and sample tenants.
const RESERVED_CLIENT_MAX: i64 = 11;

/// Entity type of records shipped with the application dictionary.
pub const ENTITY_TYPE_DICTIONARY: &str = "D";

/// Entity type of records maintained by a tenant.
pub const ENTITY_TYPE_USER_MAINTAINED: &str = "U";

/// The tenant on whose behalf edits are made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
  pub client_id: i64,
  pub org_id: i64,
  /// Entity type stamped on nodes created by non-reserved tenants.
  pub default_entity_type: String,
}

impl TenantContext {
  pub fn new(client_id: i64, org_id: i64) -> Self {
    Self {
      client_id,
      org_id,
      default_entity_type: ENTITY_TYPE_USER_MAINTAINED.to_string(),
    }
  }

  /// Ownership given to records this tenant creates.
  pub fn ownership(&self) -> Ownership {
    Ownership::new(self.client_id, self.org_id)
  }

  /// Entity type for a node this tenant creates.
  pub fn entity_type(&self) -> &str {
    if self.client_id > RESERVED_CLIENT_MAX {
      &self.default_entity_type
    } else {
      ENTITY_TYPE_DICTIONARY
    }
  }

  /// Whether records owned by `owner` are visible to this tenant.
  pub fn can_see(&self, owner: &Ownership) -> bool {
    owner.client_id == self.client_id || owner.client_id == SYSTEM_CLIENT_ID
  }

  /// Whether this tenant may edit records owned by `owner`.
  pub fn owns(&self, owner: &Ownership) -> bool {
    owner.client_id == self.client_id
  }
}

impl Default for TenantContext {
  fn default() -> Self {
    Self::new(SYSTEM_CLIENT_ID, 0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_entity_type_depends_on_client() {
    assert_eq!(TenantContext::new(11, 0).entity_type(), ENTITY_TYPE_DICTIONARY);
    assert_eq!(TenantContext::new(1000, 0).entity_type(), ENTITY_TYPE_USER_MAINTAINED);

    let mut custom = TenantContext::new(1000, 0);
    custom.default_entity_type = "EE01".to_string();
    assert_eq!(custom.entity_type(), "EE01");
  }

  #[test]
  fn test_system_records_are_visible_but_not_owned() {
    let tenant = TenantContext::new(1000, 0);
    let system = Ownership::new(SYSTEM_CLIENT_ID, 0);
    assert!(tenant.can_see(&system));
    assert!(!tenant.owns(&system));
    assert!(!tenant.can_see(&Ownership::new(2000, 0)));
  }
}
