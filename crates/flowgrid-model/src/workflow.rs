use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::graph::Graph;
use crate::{Node, NodeId, Position, Transition, TransitionId, WorkflowId};

/// Number of grid columns the editor shows for a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridColumns(u32);

impl GridColumns {
  pub const DEFAULT: GridColumns = GridColumns(4);
  pub const MAX: GridColumns = GridColumns(256);

  /// Interpret a stored or user-entered value.
  ///
  /// Anything below 1 means default; values above [`GridColumns::MAX`] are
  /// clamped to it.
  pub fn from_setting(value: i64) -> Self {
    if value < 1 {
      Self::DEFAULT
    } else {
      Self(value.min(Self::MAX.0 as i64) as u32)
    }
  }

  pub const fn get(self) -> u32 {
    self.0
  }

  /// Check whether a column index (1-based) is inside the visible grid.
  pub const fn contains(self, column: u32) -> bool {
    column >= 1 && column <= self.0
  }
}

impl Default for GridColumns {
  fn default() -> Self {
    Self::DEFAULT
  }
}

impl fmt::Display for GridColumns {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A loaded workflow: start node, nodes, transitions and grid width.
///
/// Nodes and transitions iterate in ascending id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
  pub workflow_id: WorkflowId,
  pub name: String,
  start_node: Option<NodeId>,
  grid_columns: GridColumns,
  nodes: BTreeMap<NodeId, Node>,
  transitions: BTreeMap<TransitionId, Transition>,
  graph: Graph,
}

impl Workflow {
  /// Build a workflow, validating the start node and every transition endpoint.
  pub fn new(
    workflow_id: WorkflowId,
    name: impl Into<String>,
    start_node: Option<NodeId>,
    grid_columns: GridColumns,
    nodes: impl IntoIterator<Item = Node>,
    transitions: impl IntoIterator<Item = Transition>,
  ) -> Result<Self, WorkflowError> {
    let mut node_map = BTreeMap::new();
    for node in nodes {
      let node_id = node.node_id;
      if node_map.insert(node_id, node).is_some() {
        return Err(WorkflowError::DuplicateNode(node_id));
      }
    }

    if let Some(start) = start_node {
      if !node_map.contains_key(&start) {
        return Err(WorkflowError::UnknownStartNode(start));
      }
    }

    let mut transition_map = BTreeMap::new();
    for transition in transitions {
      if !node_map.contains_key(&transition.from) || !node_map.contains_key(&transition.to) {
        return Err(WorkflowError::InvalidTransition {
          transition_id: transition.transition_id,
          from: transition.from,
          to: transition.to,
        });
      }
      if transition_map
        .insert(transition.transition_id, transition)
        .is_some()
      {
        return Err(WorkflowError::DuplicateTransition(transition.transition_id));
      }
    }

    let graph = Graph::new(&node_map, &transition_map);

    Ok(Self {
      workflow_id,
      name: name.into(),
      start_node,
      grid_columns,
      nodes: node_map,
      transitions: transition_map,
      graph,
    })
  }

  pub fn start_node(&self) -> Option<NodeId> {
    self.start_node
  }

  pub fn grid_columns(&self) -> GridColumns {
    self.grid_columns
  }

  /// The same workflow shown with a different grid width.
  pub fn with_grid_columns(mut self, grid_columns: GridColumns) -> Self {
    self.grid_columns = grid_columns;
    self
  }

  /// Get the adjacency structure for traversal.
  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Node> + '_ {
    self.nodes.values()
  }

  pub fn transitions(&self) -> impl ExactSizeIterator<Item = &Transition> + '_ {
    self.transitions.values()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Get a node by ID.
  pub fn node(&self, node_id: NodeId) -> Option<&Node> {
    self.nodes.get(&node_id)
  }

  /// Get the first node (by id) placed at a cell.
  pub fn node_at(&self, position: Position) -> Option<&Node> {
    self.nodes.values().find(|n| n.position == position)
  }

  /// Get a transition by ID.
  pub fn transition(&self, transition_id: TransitionId) -> Option<&Transition> {
    self.transitions.get(&transition_id)
  }

  /// Transitions leaving a node.
  pub fn outgoing(&self, node_id: NodeId) -> &[Transition] {
    self.graph.outgoing(node_id)
  }

  /// Nodes reached by the transitions leaving a node.
  pub fn successors(&self, node_id: NodeId) -> impl Iterator<Item = &Node> + '_ {
    self
      .graph
      .successors(node_id)
      .filter_map(|id| self.nodes.get(&id))
  }

  /// A copy of this workflow with some node positions overwritten.
  ///
  /// Unknown node ids are ignored.
  pub fn repositioned<I>(&self, positions: I) -> Self
  where
    I: IntoIterator<Item = (NodeId, Position)>,
  {
    let mut copy = self.clone();
    for (node_id, position) in positions {
      if let Some(node) = copy.nodes.get_mut(&node_id) {
        node.position = position;
      }
    }
    copy
  }
}
