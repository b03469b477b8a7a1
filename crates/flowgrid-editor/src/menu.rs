use flowgrid_model::{NodeId, TenantContext, TransitionId, Workflow};
use serde::Serialize;

use crate::action::EditAction;

/// One entry of a node's context menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MenuEntry {
  Clone {
    node_id: NodeId,
  },
  Properties {
    node_id: NodeId,
  },
  DeleteNode {
    node_id: NodeId,
  },
  AddLine {
    from: NodeId,
    to: NodeId,
  },
  DeleteLine {
    transition_id: TransitionId,
  },
  /// Asks the user for a name, then splits the transition.
  InsertOnLine {
    transition_id: TransitionId,
  },
}

impl MenuEntry {
  /// The edit this entry starts. Entries that need more input from the user
  /// (properties, insert on line) return `None`.
  pub fn action(&self) -> Option<EditAction> {
    match *self {
      MenuEntry::Clone { node_id } => Some(EditAction::CloneNode { node_id }),
      MenuEntry::DeleteNode { node_id } => Some(EditAction::DeleteNode { node_id }),
      MenuEntry::AddLine { from, to } => Some(EditAction::AddTransition { from, to }),
      MenuEntry::DeleteLine { transition_id } => {
        Some(EditAction::DeleteTransition { transition_id })
      }
      MenuEntry::Properties { .. } | MenuEntry::InsertOnLine { .. } => None,
    }
  }
}

/// Labelled menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
  pub label: String,
  pub entry: MenuEntry,
}

/// Context menu of a selected node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeMenu {
  pub node_id: NodeId,
  pub items: Vec<MenuItem>,
}

impl NodeMenu {
  /// Build the menu for `node_id`, or `None` when the node is unknown.
  ///
  /// Properties and delete are offered on the tenant's own nodes only, and
  /// line entries only for transitions the tenant owns. "Add line" skips the
  /// start node and any node already linked to the selection in either
  /// direction.
  pub fn build(workflow: &Workflow, node_id: NodeId, tenant: &TenantContext) -> Option<Self> {
    let node = workflow.node(node_id)?;
    let mut items = vec![MenuItem {
      label: "Clone".to_string(),
      entry: MenuEntry::Clone { node_id },
    }];

    if tenant.owns(&node.owner) {
      items.push(MenuItem {
        label: "Properties".to_string(),
        entry: MenuEntry::Properties { node_id },
      });
      items.push(MenuItem {
        label: format!("Delete Node: {}", node.name),
        entry: MenuEntry::DeleteNode { node_id },
      });
    }

    for other in workflow.nodes() {
      if other.node_id == node_id
        || Some(other.node_id) == workflow.start_node()
        || workflow.graph().connected(node_id, other.node_id)
      {
        continue;
      }
      items.push(MenuItem {
        label: format!("Add Line: {} -> {}", node.name, other.name),
        entry: MenuEntry::AddLine {
          from: node_id,
          to: other.node_id,
        },
      });
    }

    for transition in workflow.outgoing(node_id) {
      if !tenant.owns(&transition.owner) {
        continue;
      }
      let next = workflow
        .node(transition.to)
        .map(|n| n.name.as_str())
        .unwrap_or_default();
      items.push(MenuItem {
        label: format!("Delete Line: {} -> {}", node.name, next),
        entry: MenuEntry::DeleteLine {
          transition_id: transition.transition_id,
        },
      });
      items.push(MenuItem {
        label: format!("Insert Node: {} -> {}", node.name, next),
        entry: MenuEntry::InsertOnLine {
          transition_id: transition.transition_id,
        },
      });
    }

    Some(Self { node_id, items })
  }

  pub fn entries(&self) -> impl Iterator<Item = &MenuEntry> + '_ {
    self.items.iter().map(|item| &item.entry)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use flowgrid_model::{
    GridColumns, NodeDraft, Ownership, Transition, TransitionDraft, WorkflowId,
  };

  const ME: i64 = 1000;
  const OTHER: i64 = 2000;

  fn node(id: i64, client_id: i64) -> flowgrid_model::Node {
    NodeDraft::new(WorkflowId(1), format!("N{id}"), Ownership::new(client_id, 0), "U")
      .into_node(NodeId(id))
  }

  fn transition(id: i64, from: i64, to: i64, client_id: i64) -> Transition {
    TransitionDraft::new(NodeId(from), NodeId(to), Ownership::new(client_id, 0))
      .into_transition(TransitionId(id))
  }

  // 1 (start) -> 2, 3 -> 2, 2 -> 4 (foreign line), 5 unconnected
  fn workflow() -> Workflow {
    Workflow::new(
      WorkflowId(1),
      "wf",
      Some(NodeId(1)),
      GridColumns::DEFAULT,
      vec![node(1, ME), node(2, ME), node(3, ME), node(4, OTHER), node(5, 0)],
      vec![
        transition(10, 1, 2, ME),
        transition(11, 3, 2, ME),
        transition(12, 2, 4, OTHER),
      ],
    )
    .unwrap()
  }

  #[test]
  fn test_add_line_candidates() {
    let menu = NodeMenu::build(&workflow(), NodeId(2), &TenantContext::new(ME, 0)).unwrap();
    let targets: Vec<_> = menu
      .entries()
      .filter_map(|e| match e {
        MenuEntry::AddLine { to, .. } => Some(*to),
        _ => None,
      })
      .collect();
    // 1 is the start node, 3 and 4 are already linked to 2.
    assert_eq!(targets, vec![NodeId(5)]);
  }

  #[test]
  fn test_foreign_lines_are_not_offered() {
    let menu = NodeMenu::build(&workflow(), NodeId(2), &TenantContext::new(ME, 0)).unwrap();
    assert!(
      !menu
        .entries()
        .any(|e| matches!(e, MenuEntry::DeleteLine { .. } | MenuEntry::InsertOnLine { .. }))
    );
  }

  #[test]
  fn test_line_entries_come_in_pairs() {
    let menu = NodeMenu::build(&workflow(), NodeId(1), &TenantContext::new(ME, 0)).unwrap();
    let lines: Vec<_> = menu
      .items
      .iter()
      .filter(|i| {
        matches!(
          i.entry,
          MenuEntry::DeleteLine { .. } | MenuEntry::InsertOnLine { .. }
        )
      })
      .map(|i| i.label.as_str())
      .collect();
    assert_eq!(lines, vec!["Delete Line: N1 -> N2", "Insert Node: N1 -> N2"]);
  }

  #[test]
  fn test_properties_and_delete_only_for_own_nodes() {
    let tenant = TenantContext::new(ME, 0);
    let own = NodeMenu::build(&workflow(), NodeId(3), &tenant).unwrap();
    assert!(own.entries().any(|e| matches!(e, MenuEntry::DeleteNode { .. })));
    assert!(own.entries().any(|e| matches!(e, MenuEntry::Properties { .. })));

    let system = NodeMenu::build(&workflow(), NodeId(5), &tenant).unwrap();
    assert!(!system.entries().any(|e| matches!(e, MenuEntry::DeleteNode { .. })));
    assert_eq!(system.items[0].entry, MenuEntry::Clone { node_id: NodeId(5) });
  }

  #[test]
  fn test_unknown_node_has_no_menu() {
    assert!(NodeMenu::build(&workflow(), NodeId(99), &TenantContext::new(ME, 0)).is_none());
  }

  #[test]
  fn test_entry_actions() {
    let entry = MenuEntry::AddLine {
      from: NodeId(1),
      to: NodeId(2),
    };
    assert_eq!(
      entry.action(),
      Some(EditAction::AddTransition {
        from: NodeId(1),
        to: NodeId(2)
      })
    );
    assert_eq!(
      MenuEntry::InsertOnLine {
        transition_id: TransitionId(1)
      }
      .action(),
      None
    );
  }
}
