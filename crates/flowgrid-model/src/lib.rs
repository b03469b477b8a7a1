//! Flowgrid Model
//!
//! This crate provides the in-memory representation of a workflow graph:
//! nodes placed on a grid, directed transitions between them, and the
//! workflow aggregate that ties them to a start node and a grid column count.
//!
//! Key properties:
//! - Nodes and transitions live in arenas keyed by identifier
//! - Adjacency is computed by lookup ([`Graph`]), never by embedded pointers
//! - A [`Workflow`] is an immutable snapshot; edits go through the editor
//!   crate and are re-read from the store afterwards

mod error;
mod graph;
mod ids;
mod node;
mod tenant;
mod transition;
mod workflow;

pub use error::WorkflowError;
pub use graph::Graph;
pub use ids::{NodeId, TransitionId, WorkflowId};
pub use node::{ActionCode, ActionLinks, Node, NodeDraft, Ownership, Position};
pub use tenant::{ENTITY_TYPE_DICTIONARY, ENTITY_TYPE_USER_MAINTAINED, SYSTEM_CLIENT_ID, TenantContext};
pub use transition::{Transition, TransitionDraft};
pub use workflow::{GridColumns, Workflow};
