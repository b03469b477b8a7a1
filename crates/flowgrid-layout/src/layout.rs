//! Level-based auto layout.
//!
//! Levels come from a breadth-first walk out of the start node. A target is
//! only raised when its level is not already higher than the current node's,
//! and each node is expanded once, so on graphs with back-edges a node can end
//! up raised without its successors following. That matches the layout users
//! already have stored and is kept as is.

use std::collections::{BTreeMap, HashSet, VecDeque};

use flowgrid_model::{GridColumns, NodeId, Position, Workflow};
use tracing::{debug, warn};

/// Where one node was and where the layout puts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
  pub node_id: NodeId,
  pub from: Position,
  pub to: Position,
}

impl Placement {
  pub fn is_move(&self) -> bool {
    self.from != self.to
  }
}

/// Result of an auto-layout pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutPlan {
  /// Node the walk started from, `None` for an empty workflow.
  pub root: Option<NodeId>,
  pub levels: BTreeMap<NodeId, u32>,
  /// One entry per node, grouped by level then node order.
  pub placements: Vec<Placement>,
  /// Nodes placed right of the visible grid.
  pub overflow: Vec<NodeId>,
}

impl LayoutPlan {
  pub fn is_empty(&self) -> bool {
    self.placements.is_empty()
  }

  pub fn level(&self, node_id: NodeId) -> Option<u32> {
    self.levels.get(&node_id).copied()
  }

  /// Position assigned to a node.
  pub fn position(&self, node_id: NodeId) -> Option<Position> {
    self
      .placements
      .iter()
      .find(|p| p.node_id == node_id)
      .map(|p| p.to)
  }

  /// Placements that actually move a node.
  pub fn changed(&self) -> impl Iterator<Item = &Placement> + '_ {
    self.placements.iter().filter(|p| p.is_move())
  }

  /// The workflow with every placement applied.
  pub fn apply(&self, workflow: &Workflow) -> Workflow {
    workflow.repositioned(self.placements.iter().map(|p| (p.node_id, p.to)))
  }
}

/// Assign a level to every node, walking breadth-first from `root`.
///
/// Nodes the walk never reaches stay at level 0.
pub fn assign_levels(workflow: &Workflow, root: NodeId) -> BTreeMap<NodeId, u32> {
  let mut levels: BTreeMap<NodeId, u32> = workflow.nodes().map(|n| (n.node_id, 0)).collect();
  if !levels.contains_key(&root) {
    return levels;
  }

  let mut queue = VecDeque::from([root]);
  let mut visited = HashSet::new();

  while let Some(current) = queue.pop_front() {
    if !visited.insert(current) {
      continue;
    }

    let current_level = levels.get(&current).copied().unwrap_or(0);
    for transition in workflow.outgoing(current) {
      if let Some(next_level) = levels.get_mut(&transition.to) {
        if *next_level <= current_level {
          *next_level = current_level + 1;
          queue.push_back(transition.to);
        }
      }
    }
  }

  levels
}

/// Auto-layout engine for a fixed grid width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoLayout {
  grid_columns: GridColumns,
}

impl AutoLayout {
  pub fn new(grid_columns: GridColumns) -> Self {
    Self { grid_columns }
  }

  /// Layout engine using the workflow's own column count.
  pub fn for_workflow(workflow: &Workflow) -> Self {
    Self::new(workflow.grid_columns())
  }

  /// The start node if it is part of the workflow, else the first node.
  pub fn root(workflow: &Workflow) -> Option<NodeId> {
    workflow
      .start_node()
      .filter(|id| workflow.node(*id).is_some())
      .or_else(|| workflow.nodes().next().map(|n| n.node_id))
  }

  /// Compute levels and grid positions for every node.
  pub fn compute(&self, workflow: &Workflow) -> LayoutPlan {
    let Some(root) = Self::root(workflow) else {
      return LayoutPlan::default();
    };

    let levels = assign_levels(workflow, root);

    let mut by_level: BTreeMap<u32, Vec<NodeId>> = BTreeMap::new();
    for node in workflow.nodes() {
      let level = levels.get(&node.node_id).copied().unwrap_or(0);
      by_level.entry(level).or_default().push(node.node_id);
    }

    let mut placements = Vec::with_capacity(levels.len());
    let mut overflow = Vec::new();
    for (level, node_ids) in &by_level {
      let column = level * 2 + 1;
      for (index, node_id) in node_ids.iter().enumerate() {
        let to = Position::new(column, index as u32 * 2 + 1);
        let from = workflow
          .node(*node_id)
          .map(|n| n.position)
          .unwrap_or_default();
        if !self.grid_columns.contains(to.column) {
          overflow.push(*node_id);
        }
        placements.push(Placement {
          node_id: *node_id,
          from,
          to,
        });
      }
    }

    if !overflow.is_empty() {
      warn!(
        workflow_id = %workflow.workflow_id,
        grid_columns = %self.grid_columns,
        hidden = overflow.len(),
        "layout places nodes outside the visible grid"
      );
    }

    debug!(
      workflow_id = %workflow.workflow_id,
      root = %root,
      levels = by_level.len(),
      nodes = placements.len(),
      "computed layout"
    );

    LayoutPlan {
      root: Some(root),
      levels,
      placements,
      overflow,
    }
  }
}
