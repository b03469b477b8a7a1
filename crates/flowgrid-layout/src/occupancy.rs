use flowgrid_model::{Position, Workflow};

/// Cell occupancy of a workflow snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Occupancy<'a> {
  workflow: &'a Workflow,
}

impl<'a> Occupancy<'a> {
  pub fn new(workflow: &'a Workflow) -> Self {
    Self { workflow }
  }

  /// Check whether any node sits exactly at `position`.
  pub fn is_occupied(&self, position: Position) -> bool {
    self.workflow.nodes().any(|n| n.position == position)
  }

  /// Probe downward from `position` until a free cell is found.
  ///
  /// The column never changes. `None` when every cell down to the last row
  /// is taken.
  pub fn next_free(&self, position: Position) -> Option<Position> {
    let mut candidate = position;
    while self.is_occupied(candidate) {
      candidate = candidate.below()?;
    }
    Some(candidate)
  }
}
