use std::collections::HashMap;

use flowgrid_config::WorkflowDef;
use flowgrid_model::{
  GridColumns, NodeDraft, NodeId, Position, TenantContext, TransitionDraft, WorkflowId,
};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::Store;

/// Create a workflow, its nodes and transitions from a definition.
///
/// Everything is owned by `tenant`. Nodes keep the positions given in the
/// definition; a node without one stays at column 0 until it is laid out.
pub async fn import_workflow<S: Store + ?Sized>(
  store: &S,
  def: &WorkflowDef,
  tenant: &TenantContext,
) -> Result<WorkflowId, StoreError> {
  def.validate()?;

  let owner = tenant.ownership();
  let workflow_id = store.create_workflow(&def.name, owner).await?;
  if let Some(columns) = def.grid_columns {
    store
      .set_grid_columns(workflow_id, GridColumns::from_setting(columns as i64))
      .await?;
  }

  let mut ids: HashMap<&str, NodeId> = HashMap::with_capacity(def.nodes.len());
  for node_def in &def.nodes {
    let mut draft = NodeDraft::new(workflow_id, &node_def.name, owner, tenant.entity_type());
    draft.description = node_def.description.clone();
    draft.action = node_def.action;
    draft.links = node_def.links.clone();
    draft.position = Position::new(node_def.column, node_def.row);

    let node = store.create_node(&draft).await?;
    debug!(key = %node_def.key, node_id = %node.node_id, "imported node");
    ids.insert(node_def.key.as_str(), node.node_id);
  }

  let resolve = |key: &str| {
    ids
      .get(key)
      .copied()
      .ok_or_else(|| StoreError::Decode(format!("unresolved node key '{key}'")))
  };

  for transition in &def.transitions {
    let draft = TransitionDraft::new(resolve(&transition.from)?, resolve(&transition.to)?, owner);
    store.create_transition(&draft).await?;
  }

  if let Some(start) = &def.start {
    store.set_start_node(workflow_id, Some(resolve(start)?)).await?;
  }

  info!(
    workflow_id = %workflow_id,
    name = %def.name,
    nodes = def.nodes.len(),
    transitions = def.transitions.len(),
    "imported workflow"
  );
  Ok(workflow_id)
}
