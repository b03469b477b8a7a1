use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use flowgrid_model::{
  GridColumns, Node, NodeDraft, NodeId, Ownership, TenantContext, Transition, TransitionDraft,
  TransitionId, Workflow, WorkflowId,
};

use crate::error::StoreError;
use crate::types::{EntityKind, WorkflowRecord, WorkflowSummary};
use crate::Store;

#[derive(Debug, Default)]
struct State {
  workflows: BTreeMap<WorkflowId, WorkflowRow>,
  nodes: BTreeMap<NodeId, Node>,
  transitions: BTreeMap<TransitionId, Transition>,
  /// (kind, id) -> active
  catalog: BTreeMap<(EntityKind, i64), bool>,
  next_id: i64,
  /// Remaining writes before every write fails.
  writes_left: Option<usize>,
  writes: usize,
}

#[derive(Debug, Clone)]
struct WorkflowRow {
  summary: WorkflowSummary,
  start_node: Option<NodeId>,
}

impl State {
  fn next_id(&mut self) -> i64 {
    self.next_id += 1;
    self.next_id
  }

  fn begin_write(&mut self, operation: &'static str) -> Result<(), StoreError> {
    if let Some(left) = self.writes_left.as_mut() {
      if *left == 0 {
        return Err(StoreError::Unavailable { operation });
      }
      *left -= 1;
    }
    self.writes += 1;
    Ok(())
  }

  fn workflow_mut(&mut self, workflow_id: WorkflowId) -> Result<&mut WorkflowRow, StoreError> {
    self
      .workflows
      .get_mut(&workflow_id)
      .ok_or(StoreError::WorkflowNotFound(workflow_id))
  }
}

/// In-process store, used by tests and for scratch sessions.
///
/// Ids are assigned from one counter shared by workflows, nodes and
/// transitions. Writes can be made to fail with [`MemoryStore::fail_after_writes`].
#[derive(Debug, Default)]
pub struct MemoryStore {
  state: Mutex<State>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn state(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Register an entity that action defaults can link to.
  pub fn register_entity(&self, kind: EntityKind, entity_id: i64, active: bool) {
    self.state().catalog.insert((kind, entity_id), active);
  }

  /// Let `writes` more writes succeed, then fail every write.
  pub fn fail_after_writes(&self, writes: usize) {
    self.state().writes_left = Some(writes);
  }

  /// Stop failing writes.
  pub fn clear_failure(&self) {
    self.state().writes_left = None;
  }

  /// Number of successful writes so far.
  pub fn write_count(&self) -> usize {
    self.state().writes
  }
}

#[async_trait]
impl Store for MemoryStore {
  async fn list_workflows(&self, client_id: i64) -> Result<Vec<WorkflowSummary>, StoreError> {
    let tenant = TenantContext::new(client_id, 0);
    let mut workflows: Vec<WorkflowSummary> = self
      .state()
      .workflows
      .values()
      .filter(|w| tenant.can_see(&w.summary.owner))
      .map(|w| w.summary.clone())
      .collect();
    workflows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(workflows)
  }

  async fn create_workflow(&self, name: &str, owner: Ownership) -> Result<WorkflowId, StoreError> {
    let mut state = self.state();
    state.begin_write("create_workflow")?;
    let workflow_id = WorkflowId(state.next_id());
    state.workflows.insert(
      workflow_id,
      WorkflowRow {
        summary: WorkflowSummary {
          workflow_id,
          name: name.to_string(),
          owner,
          grid_columns: None,
          created_at: Utc::now(),
        },
        start_node: None,
      },
    );
    Ok(workflow_id)
  }

  async fn load_workflow(
    &self,
    workflow_id: WorkflowId,
    tenant: &TenantContext,
  ) -> Result<Workflow, StoreError> {
    let record = {
      let state = self.state();
      let row = state
        .workflows
        .get(&workflow_id)
        .ok_or(StoreError::WorkflowNotFound(workflow_id))?;

      let nodes: Vec<Node> = state
        .nodes
        .values()
        .filter(|n| n.workflow_id == workflow_id)
        .cloned()
        .collect();
      let node_ids: BTreeSet<NodeId> = nodes.iter().map(|n| n.node_id).collect();
      let transitions = state
        .transitions
        .values()
        .filter(|t| node_ids.contains(&t.from))
        .copied()
        .collect();

      WorkflowRecord {
        workflow_id,
        name: row.summary.name.clone(),
        start_node: row.start_node,
        grid_columns: row.summary.grid_columns,
        nodes,
        transitions,
      }
    };
    record.into_workflow(tenant)
  }

  async fn set_start_node(
    &self,
    workflow_id: WorkflowId,
    node_id: Option<NodeId>,
  ) -> Result<(), StoreError> {
    let mut state = self.state();
    if let Some(id) = node_id {
      if !state.nodes.contains_key(&id) {
        return Err(StoreError::NodeNotFound(id));
      }
    }
    state.workflow_mut(workflow_id)?;
    state.begin_write("set_start_node")?;
    state.workflow_mut(workflow_id)?.start_node = node_id;
    Ok(())
  }

  async fn grid_columns(&self, workflow_id: WorkflowId) -> Result<Option<GridColumns>, StoreError> {
    self
      .state()
      .workflows
      .get(&workflow_id)
      .map(|w| w.summary.grid_columns)
      .ok_or(StoreError::WorkflowNotFound(workflow_id))
  }

  async fn set_grid_columns(
    &self,
    workflow_id: WorkflowId,
    grid_columns: GridColumns,
  ) -> Result<(), StoreError> {
    let mut state = self.state();
    state.workflow_mut(workflow_id)?;
    state.begin_write("set_grid_columns")?;
    state.workflow_mut(workflow_id)?.summary.grid_columns = Some(grid_columns);
    Ok(())
  }

  async fn create_node(&self, draft: &NodeDraft) -> Result<Node, StoreError> {
    let mut state = self.state();
    state.workflow_mut(draft.workflow_id)?;
    state.begin_write("create_node")?;
    let node = draft.clone().into_node(NodeId(state.next_id()));
    state.nodes.insert(node.node_id, node.clone());
    Ok(node)
  }

  async fn update_node(&self, node: &Node) -> Result<(), StoreError> {
    let mut state = self.state();
    if !state.nodes.contains_key(&node.node_id) {
      return Err(StoreError::NodeNotFound(node.node_id));
    }
    state.begin_write("update_node")?;
    state.nodes.insert(node.node_id, node.clone());
    Ok(())
  }

  async fn delete_node(&self, node_id: NodeId) -> Result<bool, StoreError> {
    let mut state = self.state();
    let Some(workflow_id) = state.nodes.get(&node_id).map(|n| n.workflow_id) else {
      return Ok(false);
    };
    let is_start = state
      .workflows
      .get(&workflow_id)
      .is_some_and(|w| w.start_node == Some(node_id));
    if is_start {
      return Ok(false);
    }

    state.begin_write("delete_node")?;
    state.nodes.remove(&node_id);
    state
      .transitions
      .retain(|_, t| t.from != node_id && t.to != node_id);
    Ok(true)
  }

  async fn create_transition(&self, draft: &TransitionDraft) -> Result<Transition, StoreError> {
    let mut state = self.state();
    for id in [draft.from, draft.to] {
      if !state.nodes.contains_key(&id) {
        return Err(StoreError::NodeNotFound(id));
      }
    }
    state.begin_write("create_transition")?;
    let transition = draft.into_transition(TransitionId(state.next_id()));
    state.transitions.insert(transition.transition_id, transition);
    Ok(transition)
  }

  async fn delete_transition(&self, transition_id: TransitionId) -> Result<bool, StoreError> {
    let mut state = self.state();
    if !state.transitions.contains_key(&transition_id) {
      return Ok(false);
    }
    state.begin_write("delete_transition")?;
    state.transitions.remove(&transition_id);
    Ok(true)
  }

  async fn find_first_active(
    &self,
    kind: EntityKind,
    exclude: Option<i64>,
  ) -> Result<Option<i64>, StoreError> {
    Ok(
      self
        .state()
        .catalog
        .iter()
        .filter(|((k, id), active)| *k == kind && **active && Some(*id) != exclude)
        .map(|((_, id), _)| *id)
        .next(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use flowgrid_model::Position;

  fn tenant() -> TenantContext {
    TenantContext::new(1000, 0)
  }

  async fn seeded() -> (MemoryStore, WorkflowId, Node, Node) {
    let store = MemoryStore::new();
    let wf = store
      .create_workflow("Assembly", tenant().ownership())
      .await
      .unwrap();
    let a = store
      .create_node(&NodeDraft::new(wf, "A", tenant().ownership(), "U"))
      .await
      .unwrap();
    let b = store
      .create_node(&NodeDraft::new(wf, "B", tenant().ownership(), "U"))
      .await
      .unwrap();
    (store, wf, a, b)
  }

  #[tokio::test]
  async fn test_round_trip_workflow() {
    let (store, wf, a, b) = seeded().await;
    let t = store
      .create_transition(&TransitionDraft::new(a.node_id, b.node_id, tenant().ownership()))
      .await
      .unwrap();
    store.set_start_node(wf, Some(a.node_id)).await.unwrap();

    let loaded = store.load_workflow(wf, &tenant()).await.unwrap();
    assert_eq!(loaded.name, "Assembly");
    assert_eq!(loaded.start_node(), Some(a.node_id));
    assert_eq!(loaded.nodes().count(), 2);
    assert_eq!(loaded.transition(t.transition_id), Some(&t));
  }

  #[tokio::test]
  async fn test_delete_node_cascades_transitions() {
    let (store, wf, a, b) = seeded().await;
    store
      .create_transition(&TransitionDraft::new(a.node_id, b.node_id, tenant().ownership()))
      .await
      .unwrap();
    store
      .create_transition(&TransitionDraft::new(b.node_id, a.node_id, tenant().ownership()))
      .await
      .unwrap();

    assert!(store.delete_node(b.node_id).await.unwrap());
    let loaded = store.load_workflow(wf, &tenant()).await.unwrap();
    assert_eq!(loaded.nodes().count(), 1);
    assert_eq!(loaded.transitions().count(), 0);
  }

  #[tokio::test]
  async fn test_delete_start_node_is_refused() {
    let (store, wf, a, _) = seeded().await;
    store.set_start_node(wf, Some(a.node_id)).await.unwrap();
    assert!(!store.delete_node(a.node_id).await.unwrap());
    assert!(!store.delete_node(NodeId(999)).await.unwrap());
  }

  #[tokio::test]
  async fn test_update_node_overwrites_position() {
    let (store, wf, mut a, _) = seeded().await;
    a.position = Position::new(3, 5);
    store.update_node(&a).await.unwrap();
    let loaded = store.load_workflow(wf, &tenant()).await.unwrap();
    assert_eq!(loaded.node(a.node_id).unwrap().position, Position::new(3, 5));
  }

  #[tokio::test]
  async fn test_grid_columns_unset_until_written() {
    let (store, wf, _, _) = seeded().await;
    assert_eq!(store.grid_columns(wf).await.unwrap(), None);
    store
      .set_grid_columns(wf, GridColumns::from_setting(6))
      .await
      .unwrap();
    assert_eq!(
      store.grid_columns(wf).await.unwrap(),
      Some(GridColumns::from_setting(6))
    );
    let loaded = store.load_workflow(wf, &tenant()).await.unwrap();
    assert_eq!(loaded.grid_columns().get(), 6);
  }

  #[tokio::test]
  async fn test_find_first_active_skips_inactive_and_excluded() {
    let store = MemoryStore::new();
    store.register_entity(EntityKind::Window, 200, true);
    store.register_entity(EntityKind::Window, 100, false);
    store.register_entity(EntityKind::Window, 150, true);
    store.register_entity(EntityKind::Form, 1, true);

    assert_eq!(store.find_first_active(EntityKind::Window, None).await.unwrap(), Some(150));
    assert_eq!(
      store.find_first_active(EntityKind::Window, Some(150)).await.unwrap(),
      Some(200)
    );
    assert_eq!(store.find_first_active(EntityKind::Task, None).await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_failure_injection() {
    let (store, wf, _, _) = seeded().await;
    store.fail_after_writes(1);
    store
      .create_node(&NodeDraft::new(wf, "C", tenant().ownership(), "U"))
      .await
      .unwrap();
    let err = store
      .create_node(&NodeDraft::new(wf, "D", tenant().ownership(), "U"))
      .await
      .unwrap_err();
    assert!(matches!(err, StoreError::Unavailable { operation: "create_node" }));

    store.clear_failure();
    assert!(store
      .create_node(&NodeDraft::new(wf, "E", tenant().ownership(), "U"))
      .await
      .is_ok());
  }

  #[tokio::test]
  async fn test_list_workflows_by_tenant_and_name() {
    let store = MemoryStore::new();
    store.create_workflow("Zeta", Ownership::new(1000, 0)).await.unwrap();
    store.create_workflow("Alpha", Ownership::new(0, 0)).await.unwrap();
    store.create_workflow("Other", Ownership::new(2000, 0)).await.unwrap();

    let names: Vec<_> = store
      .list_workflows(1000)
      .await
      .unwrap()
      .into_iter()
      .map(|w| w.name)
      .collect();
    assert_eq!(names, vec!["Alpha", "Zeta"]);
  }
}
