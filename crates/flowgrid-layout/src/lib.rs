//! Flowgrid Layout
//!
//! Placement algorithms over a [`flowgrid_model::Workflow`] snapshot:
//!
//! - [`Occupancy`]: is a cell taken, and the next free cell below it
//! - [`AutoLayout`]: breadth-first levels from the start node, one level per
//!   odd column, one node per odd row
//! - [`GridView`]: the cells a host renders for the configured column count
//!
//! Nothing here writes to a store. Callers persist the positions a
//! [`LayoutPlan`] produces.

mod grid;
mod layout;
mod occupancy;

pub use grid::{GridCell, GridView};
pub use layout::{AutoLayout, LayoutPlan, Placement, assign_levels};
pub use occupancy::Occupancy;
