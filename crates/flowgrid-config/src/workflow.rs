use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::node::NodeDef;
use crate::transition::TransitionDef;

/// A workflow definition, as written by hand or exported from another system.
///
/// # Example
///
/// ```json
/// {
///   "name": "Garment cutting",
///   "grid_columns": 6,
///   "start": "cut",
///   "nodes": [
///     { "key": "cut", "name": "Cut", "action": "user_window", "links": { "window_id": 143 } },
///     { "key": "sew", "name": "Sew" }
///   ],
///   "transitions": [{ "from": "cut", "to": "sew" }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub grid_columns: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub start: Option<String>,
  #[serde(default)]
  pub nodes: Vec<NodeDef>,
  #[serde(default)]
  pub transitions: Vec<TransitionDef>,
}

impl WorkflowDef {
  /// Parse and validate a definition from JSON.
  pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
    let def: WorkflowDef = serde_json::from_str(json)?;
    def.validate()?;
    Ok(def)
  }

  /// Validate that keys are unique and every reference resolves.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if let Some(value) = self.grid_columns {
      if value < 1 {
        return Err(ConfigError::InvalidGridColumns { value });
      }
    }

    let mut keys = HashSet::new();
    for node in &self.nodes {
      if !keys.insert(node.key.as_str()) {
        return Err(ConfigError::DuplicateNodeKey {
          key: node.key.clone(),
        });
      }
      if node.name.trim().is_empty() {
        return Err(ConfigError::EmptyName {
          key: node.key.clone(),
        });
      }
    }

    if let Some(start) = &self.start {
      if !keys.contains(start.as_str()) {
        return Err(ConfigError::UnknownStartNode { key: start.clone() });
      }
    }

    for transition in &self.transitions {
      for key in [&transition.from, &transition.to] {
        if !keys.contains(key.as_str()) {
          return Err(ConfigError::UnknownNodeKey { key: key.clone() });
        }
      }
    }

    Ok(())
  }
}
