use flowgrid_model::{ENTITY_TYPE_USER_MAINTAINED, GridColumns, TenantContext};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Defaults for an edit session.
///
/// Every field is optional in JSON; missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
  /// Grid width used when a workflow has no stored column count.
  pub default_grid_columns: u32,
  /// Run auto-layout the first time a workflow is opened in a session.
  pub layout_on_first_load: bool,
  /// Acting tenant.
  pub client_id: i64,
  pub org_id: i64,
  /// Entity type stamped on nodes created by non-system tenants.
  pub default_entity_type: String,
}

impl EditorSettings {
  pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(json)?)
  }

  /// Default grid width, falling back to 4 for values below 1.
  pub fn grid_columns(&self) -> GridColumns {
    GridColumns::from_setting(self.default_grid_columns as i64)
  }

  /// The tenant edits are made for.
  pub fn tenant(&self) -> TenantContext {
    let mut tenant = TenantContext::new(self.client_id, self.org_id);
    tenant.default_entity_type = self.default_entity_type.clone();
    tenant
  }
}

impl Default for EditorSettings {
  fn default() -> Self {
    Self {
      default_grid_columns: GridColumns::DEFAULT.get(),
      layout_on_first_load: true,
      client_id: 0,
      org_id: 0,
      default_entity_type: ENTITY_TYPE_USER_MAINTAINED.to_string(),
    }
  }
}
