use flowgrid_model::{GridColumns, NodeId, Position, Workflow};
use serde::Serialize;

/// One cell of the visible grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridCell {
  pub position: Position,
  /// Node drawn in the cell; the lowest id wins when several share it.
  pub node: Option<NodeId>,
}

/// The cells a host renders for a workflow.
///
/// Columns run `1..=grid_columns`, rows `1..=max_row + 1` so that there is
/// always an empty row to drop new nodes into. Rows stop at
/// [`GridView::MAX_ROWS`]; nodes placed further down are listed as hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridView {
  pub columns: GridColumns,
  pub rows: u32,
  /// Row-major.
  pub cells: Vec<GridCell>,
  /// Nodes that are not drawn in any visible cell.
  pub hidden: Vec<NodeId>,
}

impl GridView {
  pub const MAX_ROWS: u32 = 4096;

  pub fn build(workflow: &Workflow) -> Self {
    let columns = workflow.grid_columns();
    let max_row = workflow.nodes().map(|n| n.position.row).max().unwrap_or(0);
    let rows = max_row.saturating_add(1).min(Self::MAX_ROWS);

    let capacity = (rows as usize)
      .checked_mul(columns.get() as usize)
      .unwrap_or_default();
    let mut cells = Vec::with_capacity(capacity);
    for row in 1..=rows {
      for column in 1..=columns.get() {
        let position = Position::new(column, row);
        cells.push(GridCell {
          position,
          node: workflow.node_at(position).map(|n| n.node_id),
        });
      }
    }

    let hidden = workflow
      .nodes()
      .filter(|n| {
        !columns.contains(n.position.column) || n.position.row == 0 || n.position.row > rows
      })
      .map(|n| n.node_id)
      .collect();

    Self {
      columns,
      rows,
      cells,
      hidden,
    }
  }

  pub fn cell(&self, position: Position) -> Option<&GridCell> {
    if !self.columns.contains(position.column) || position.row == 0 || position.row > self.rows {
      return None;
    }
    let index =
      (position.row as usize - 1) * self.columns.get() as usize + (position.column as usize - 1);
    self.cells.get(index)
  }

  /// Cells of a 1-based row.
  pub fn row(&self, row: u32) -> &[GridCell] {
    if row == 0 || row > self.rows {
      return &[];
    }
    let width = self.columns.get() as usize;
    let start = (row as usize - 1) * width;
    &self.cells[start..start + width]
  }
}
