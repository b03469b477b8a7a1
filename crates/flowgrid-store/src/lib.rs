//! Flowgrid Store
//!
//! This crate provides the storage trait and implementations for workflow
//! graphs. It is the persistence collaborator of the editor: every node and
//! transition write goes through a [`Store`], and the editor re-reads the
//! workflow afterwards instead of patching its own copy.
//!
//! The [`Store`] trait defines operations for:
//! - Listing, creating and loading workflows
//! - Creating, updating and deleting nodes and transitions
//! - Reading and writing the grid column count of a workflow
//! - Looking up the first active entity of a kind, used to fill the
//!   mandatory links of action-typed nodes
//!
//! Implementations: [`SqliteStore`] (sqlx) and [`MemoryStore`].

mod error;
mod import;
mod memory;
mod sqlite;
mod types;

pub use error::StoreError;
pub use import::import_workflow;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use types::{EntityKind, WorkflowRecord, WorkflowSummary};

use async_trait::async_trait;
use flowgrid_model::{
  GridColumns, Node, NodeDraft, NodeId, Ownership, TenantContext, Transition, TransitionDraft,
  TransitionId, Workflow, WorkflowId,
};

/// Storage trait for workflow graphs.
#[async_trait]
pub trait Store: Send + Sync {
  /// List active workflows visible to a client, ordered by name.
  async fn list_workflows(&self, client_id: i64) -> Result<Vec<WorkflowSummary>, StoreError>;

  /// Create an empty workflow.
  async fn create_workflow(&self, name: &str, owner: Ownership) -> Result<WorkflowId, StoreError>;

  /// Load a workflow with the nodes and transitions visible to a tenant.
  ///
  /// Always reads from storage. The grid column count is the stored value,
  /// or the default when none is stored.
  async fn load_workflow(
    &self,
    workflow_id: WorkflowId,
    tenant: &TenantContext,
  ) -> Result<Workflow, StoreError>;

  /// Set or clear the start node of a workflow.
  async fn set_start_node(
    &self,
    workflow_id: WorkflowId,
    node_id: Option<NodeId>,
  ) -> Result<(), StoreError>;

  /// Stored grid column count, `None` when never set.
  async fn grid_columns(&self, workflow_id: WorkflowId) -> Result<Option<GridColumns>, StoreError>;

  /// Store the grid column count of a workflow.
  async fn set_grid_columns(
    &self,
    workflow_id: WorkflowId,
    grid_columns: GridColumns,
  ) -> Result<(), StoreError>;

  /// Persist a new node and return it with its assigned id.
  async fn create_node(&self, draft: &NodeDraft) -> Result<Node, StoreError>;

  /// Overwrite every attribute of an existing node.
  async fn update_node(&self, node: &Node) -> Result<(), StoreError>;

  /// Delete a node and the transitions entering or leaving it.
  ///
  /// Returns `false` when the delete is refused (unknown node, or the node is
  /// still the start node of its workflow).
  async fn delete_node(&self, node_id: NodeId) -> Result<bool, StoreError>;

  /// Persist a new transition and return it with its assigned id.
  async fn create_transition(&self, draft: &TransitionDraft) -> Result<Transition, StoreError>;

  /// Delete a transition. Returns `false` when it does not exist.
  async fn delete_transition(&self, transition_id: TransitionId) -> Result<bool, StoreError>;

  /// Lowest id of an active entity of `kind`, skipping `exclude`.
  async fn find_first_active(
    &self,
    kind: EntityKind,
    exclude: Option<i64>,
  ) -> Result<Option<i64>, StoreError>;
}
