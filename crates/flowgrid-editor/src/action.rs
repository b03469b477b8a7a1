use flowgrid_model::{ActionCode, NodeId, Position, TransitionId};
use serde::{Deserialize, Serialize};

/// A user edit, as dispatched by a host to an edit session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditAction {
  CreateNode {
    name: String,
  },
  CloneNode {
    node_id: NodeId,
  },
  /// Insert a named node on a transition.
  SplitTransition {
    transition_id: TransitionId,
    name: String,
  },
  /// An action dropped on a cell, empty or not.
  DropAction {
    action: ActionCode,
    position: Position,
  },
  InsertAfterNode {
    action: ActionCode,
    target: NodeId,
  },
  MoveNode {
    node_id: NodeId,
    position: Position,
  },
  EditNode {
    node_id: NodeId,
    name: String,
    #[serde(default)]
    description: Option<String>,
  },
  DeleteNode {
    node_id: NodeId,
  },
  AddTransition {
    from: NodeId,
    to: NodeId,
  },
  DeleteTransition {
    transition_id: TransitionId,
  },
  AutoLayout,
}

impl EditAction {
  pub fn name(&self) -> &'static str {
    match self {
      EditAction::CreateNode { .. } => "create_node",
      EditAction::CloneNode { .. } => "clone_node",
      EditAction::SplitTransition { .. } => "split_transition",
      EditAction::DropAction { .. } => "drop_action",
      EditAction::InsertAfterNode { .. } => "insert_after_node",
      EditAction::MoveNode { .. } => "move_node",
      EditAction::EditNode { .. } => "edit_node",
      EditAction::DeleteNode { .. } => "delete_node",
      EditAction::AddTransition { .. } => "add_transition",
      EditAction::DeleteTransition { .. } => "delete_transition",
      EditAction::AutoLayout => "auto_layout",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_actions_are_tagged_by_kind() {
    let action: EditAction = serde_json::from_str(
      r#"{ "kind": "drop_action", "action": "user_window", "position": { "column": 3, "row": 2 } }"#,
    )
    .unwrap();
    assert_eq!(
      action,
      EditAction::DropAction {
        action: ActionCode::UserWindow,
        position: Position::new(3, 2),
      }
    );
    assert_eq!(action.name(), "drop_action");

    let json = serde_json::to_value(EditAction::AutoLayout).unwrap();
    assert_eq!(json["kind"], "auto_layout");
  }
}
