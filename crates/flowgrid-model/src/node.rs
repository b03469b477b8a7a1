use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{NodeId, WorkflowId};

/// A cell on the editor grid.
///
/// Columns and rows are 1-based when visible; 0 is the position of a node
/// that has never been placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
  pub column: u32,
  pub row: u32,
}

impl Position {
  pub const fn new(column: u32, row: u32) -> Self {
    Self { column, row }
  }

  /// The cell directly below this one, `None` on the last row.
  pub const fn below(self) -> Option<Self> {
    match self.row.checked_add(1) {
      Some(row) => Some(Self::new(self.column, row)),
      None => None,
    }
  }

  /// The cell `columns` to the right of this one, stopping at the last column.
  pub const fn right(self, columns: u32) -> Self {
    Self::new(self.column.saturating_add(columns), self.row)
  }

  /// Integer midpoint between two cells (truncating).
  pub fn midpoint(self, other: Position) -> Self {
    Self::new(
      ((self.column as u64 + other.column as u64) / 2) as u32,
      ((self.row as u64 + other.row as u64) / 2) as u32,
    )
  }

  /// Integer mean of a set of cells, or `None` for an empty set.
  pub fn mean<I>(positions: I) -> Option<Self>
  where
    I: IntoIterator<Item = Position>,
  {
    let (count, columns, rows) = positions
      .into_iter()
      .fold((0u64, 0u64, 0u64), |(n, c, r), p| {
        (n + 1, c + p.column as u64, r + p.row as u64)
      });
    if count == 0 {
      return None;
    }
    Some(Self::new((columns / count) as u32, (rows / count) as u32))
  }
}

impl fmt::Display for Position {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {})", self.column, self.row)
  }
}

/// Tenant and organization owning a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Ownership {
  pub client_id: i64,
  pub org_id: i64,
}

impl Ownership {
  pub const fn new(client_id: i64, org_id: i64) -> Self {
    Self { client_id, org_id }
  }
}

/// What a node does when the workflow reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCode {
  ExternalProcess,
  ExternalReport,
  ExternalTask,
  DocumentAction,
  SendEmail,
  SetVariable,
  SubWorkflow,
  UserChoice,
  UserForm,
  UserWindow,
  UserInfoWindow,
}

impl ActionCode {
  pub const ALL: [ActionCode; 11] = [
    ActionCode::ExternalProcess,
    ActionCode::ExternalReport,
    ActionCode::ExternalTask,
    ActionCode::DocumentAction,
    ActionCode::SendEmail,
    ActionCode::SetVariable,
    ActionCode::SubWorkflow,
    ActionCode::UserChoice,
    ActionCode::UserForm,
    ActionCode::UserWindow,
    ActionCode::UserInfoWindow,
  ];

  /// Single-letter code used by the store.
  pub const fn code(self) -> &'static str {
    match self {
      ActionCode::ExternalProcess => "P",
      ActionCode::ExternalReport => "R",
      ActionCode::ExternalTask => "T",
      ActionCode::DocumentAction => "D",
      ActionCode::SendEmail => "M",
      ActionCode::SetVariable => "V",
      ActionCode::SubWorkflow => "F",
      ActionCode::UserChoice => "C",
      ActionCode::UserForm => "X",
      ActionCode::UserWindow => "W",
      ActionCode::UserInfoWindow => "I",
    }
  }

  pub fn from_code(code: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|action| action.code() == code)
  }

  pub const fn label(self) -> &'static str {
    match self {
      ActionCode::ExternalProcess => "Apps Process",
      ActionCode::ExternalReport => "Apps Report",
      ActionCode::ExternalTask => "Apps Task",
      ActionCode::DocumentAction => "Document Action",
      ActionCode::SendEmail => "EMail",
      ActionCode::SetVariable => "Set Variable",
      ActionCode::SubWorkflow => "Sub Workflow",
      ActionCode::UserChoice => "User Choice",
      ActionCode::UserForm => "User Form",
      ActionCode::UserWindow => "User Window",
      ActionCode::UserInfoWindow => "User Info",
    }
  }
}

/// Entities an action-typed node links to.
///
/// Which fields matter depends on the node's [`ActionCode`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionLinks {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub process_id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub task_id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub doc_action: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub mail_text_id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub column_id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub attribute_value: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub subflow_id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub form_id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub window_id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub info_window_id: Option<i64>,
}

/// A node that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDraft {
  pub workflow_id: WorkflowId,
  pub name: String,
  pub description: Option<String>,
  pub action: Option<ActionCode>,
  pub links: ActionLinks,
  pub position: Position,
  pub owner: Ownership,
  pub entity_type: String,
}

impl NodeDraft {
  pub fn new(
    workflow_id: WorkflowId,
    name: impl Into<String>,
    owner: Ownership,
    entity_type: impl Into<String>,
  ) -> Self {
    Self {
      workflow_id,
      name: name.into(),
      description: None,
      action: None,
      links: ActionLinks::default(),
      position: Position::default(),
      owner,
      entity_type: entity_type.into(),
    }
  }

  /// Attach the identifier the store assigned.
  pub fn into_node(self, node_id: NodeId) -> Node {
    Node {
      node_id,
      workflow_id: self.workflow_id,
      name: self.name,
      description: self.description,
      action: self.action,
      links: self.links,
      position: self.position,
      owner: self.owner,
      entity_type: self.entity_type,
    }
  }
}

/// A workflow step with a grid position and an action type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
  pub node_id: NodeId,
  pub workflow_id: WorkflowId,
  pub name: String,
  pub description: Option<String>,
  pub action: Option<ActionCode>,
  pub links: ActionLinks,
  pub position: Position,
  pub owner: Ownership,
  pub entity_type: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_action_code_round_trips_through_store_code() {
    for action in ActionCode::ALL {
      assert_eq!(ActionCode::from_code(action.code()), Some(action));
    }
    assert_eq!(ActionCode::from_code("?"), None);
  }

  #[test]
  fn test_action_code_json_uses_snake_case() {
    let json = serde_json::to_string(&ActionCode::UserInfoWindow).unwrap();
    assert_eq!(json, "\"user_info_window\"");
  }

  #[test]
  fn test_midpoint_truncates() {
    let a = Position::new(1, 1);
    let b = Position::new(4, 2);
    assert_eq!(a.midpoint(b), Position::new(2, 1));
  }

  #[test]
  fn test_neighbours_stop_at_the_grid_edge() {
    assert_eq!(Position::new(2, 3).below(), Some(Position::new(2, 4)));
    assert_eq!(Position::new(2, u32::MAX).below(), None);
    assert_eq!(Position::new(2, 3).right(2), Position::new(4, 3));
    assert_eq!(Position::new(u32::MAX - 1, 3).right(2), Position::new(u32::MAX, 3));
  }

  #[test]
  fn test_mean_of_empty_set_is_none() {
    assert_eq!(Position::mean(Vec::new()), None);
    assert_eq!(
      Position::mean(vec![Position::new(3, 1), Position::new(3, 4)]),
      Some(Position::new(3, 2))
    );
  }

  #[test]
  fn test_links_skip_empty_fields() {
    let links = ActionLinks {
      window_id: Some(143),
      ..Default::default()
    };
    let json = serde_json::to_value(&links).unwrap();
    assert_eq!(json, serde_json::json!({ "window_id": 143 }));
  }
}
