use flowgrid_model::{ActionCode, ActionLinks};
use serde::{Deserialize, Serialize};

/// A node in a workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  /// Key used by transitions and `start` to refer to this node.
  pub key: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub action: Option<ActionCode>,
  #[serde(default)]
  pub links: ActionLinks,
  #[serde(default)]
  pub column: u32,
  #[serde(default)]
  pub row: u32,
}
