use chrono::{DateTime, Utc};
use flowgrid_model::{
  GridColumns, Node, NodeId, Ownership, TenantContext, Transition, Workflow, WorkflowId,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;

/// Kind of entity an action-typed node can link to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
  Process,
  Task,
  MailText,
  Column,
  Workflow,
  Form,
  Window,
  InfoWindow,
}

impl EntityKind {
  pub const fn as_str(self) -> &'static str {
    match self {
      EntityKind::Process => "process",
      EntityKind::Task => "task",
      EntityKind::MailText => "mail_text",
      EntityKind::Column => "column",
      EntityKind::Workflow => "workflow",
      EntityKind::Form => "form",
      EntityKind::Window => "window",
      EntityKind::InfoWindow => "info_window",
    }
  }
}

/// A workflow as listed for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSummary {
  pub workflow_id: WorkflowId,
  pub name: String,
  pub owner: Ownership,
  pub grid_columns: Option<GridColumns>,
  pub created_at: DateTime<Utc>,
}

/// Raw records of one workflow as read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRecord {
  pub workflow_id: WorkflowId,
  pub name: String,
  pub start_node: Option<NodeId>,
  pub grid_columns: Option<GridColumns>,
  pub nodes: Vec<Node>,
  pub transitions: Vec<Transition>,
}

impl WorkflowRecord {
  /// Build the workflow a tenant sees.
  ///
  /// Nodes and transitions of other tenants are dropped, as are transitions
  /// and a start node pointing at nodes that did not survive the filter.
  pub fn into_workflow(self, tenant: &TenantContext) -> Result<Workflow, StoreError> {
    let nodes: Vec<Node> = self
      .nodes
      .into_iter()
      .filter(|n| tenant.can_see(&n.owner))
      .collect();
    let known = |id: NodeId| nodes.iter().any(|n| n.node_id == id);

    let mut transitions = Vec::with_capacity(self.transitions.len());
    for transition in self.transitions {
      if !tenant.can_see(&transition.owner) {
        continue;
      }
      if known(transition.from) && known(transition.to) {
        transitions.push(transition);
      } else {
        warn!(
          workflow_id = %self.workflow_id,
          transition_id = %transition.transition_id,
          "dropping transition to a node outside the workflow"
        );
      }
    }

    let start_node = match self.start_node {
      Some(id) if known(id) => Some(id),
      Some(id) => {
        warn!(
          workflow_id = %self.workflow_id,
          node_id = %id,
          "start node is not visible, ignoring it"
        );
        None
      }
      None => None,
    };

    Ok(Workflow::new(
      self.workflow_id,
      self.name,
      start_node,
      self.grid_columns.unwrap_or_default(),
      nodes,
      transitions,
    )?)
  }
}
