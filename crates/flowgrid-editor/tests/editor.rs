//! Integration tests for the mutation engine against the in-memory store.

use std::sync::Arc;

use flowgrid_editor::{EditAction, EditError, EditOutcome, Editor};
use flowgrid_model::{
  ActionCode, NodeDraft, NodeId, Ownership, Position, TenantContext, TransitionDraft,
  TransitionId, Workflow, WorkflowId,
};
use flowgrid_store::{EntityKind, MemoryStore, Store, StoreError};

const ME: i64 = 1000000;

fn tenant() -> TenantContext {
  TenantContext::new(ME, 0)
}

struct Fixture {
  store: Arc<MemoryStore>,
  workflow_id: WorkflowId,
  editor: Editor<MemoryStore>,
}

impl Fixture {
  async fn new() -> Self {
    let store = Arc::new(MemoryStore::new());
    let workflow_id = store
      .create_workflow("Orders", tenant().ownership())
      .await
      .unwrap();
    let editor = Editor::new(store.clone(), tenant());
    Self {
      store,
      workflow_id,
      editor,
    }
  }

  async fn node_owned(&self, name: &str, column: u32, row: u32, owner: Ownership) -> NodeId {
    let mut draft = NodeDraft::new(self.workflow_id, name, owner, "U");
    draft.position = Position::new(column, row);
    self.store.create_node(&draft).await.unwrap().node_id
  }

  async fn node(&self, name: &str, column: u32, row: u32) -> NodeId {
    self.node_owned(name, column, row, tenant().ownership()).await
  }

  async fn line(&self, from: NodeId, to: NodeId) -> TransitionId {
    self
      .store
      .create_transition(&TransitionDraft::new(from, to, tenant().ownership()))
      .await
      .unwrap()
      .transition_id
  }

  async fn start(&self, node_id: NodeId) {
    self
      .store
      .set_start_node(self.workflow_id, Some(node_id))
      .await
      .unwrap();
  }

  async fn load(&self) -> Workflow {
    self
      .store
      .load_workflow(self.workflow_id, &tenant())
      .await
      .unwrap()
  }
}

fn pairs(workflow: &Workflow) -> Vec<(NodeId, NodeId)> {
  workflow.transitions().map(|t| (t.from, t.to)).collect()
}

#[tokio::test]
async fn test_split_transition_replaces_the_edge() {
  let fx = Fixture::new().await;
  let a = fx.node("A", 1, 1).await;
  let b = fx.node("B", 3, 1).await;
  fx.start(a).await;
  let ab = fx.line(a, b).await;

  let before = fx.load().await;
  let outcome = fx.editor.split_transition(&before, ab, "Check").await.unwrap();
  let created = outcome.created_node().unwrap().clone();

  let after = fx.load().await;
  assert!(before.node(created.node_id).is_none());
  assert!(after.transition(ab).is_none());
  assert_eq!(pairs(&after), vec![(a, created.node_id), (created.node_id, b)]);

  let n = after.node(created.node_id).unwrap();
  assert_eq!(n.name, "Check");
  assert_eq!(n.position, Position::new(2, 1));
  assert_eq!(n.entity_type, "U");
}

#[tokio::test]
async fn test_split_transition_probes_down_from_midpoint() {
  let fx = Fixture::new().await;
  let a = fx.node("A", 1, 1).await;
  let b = fx.node("B", 3, 1).await;
  let c = fx.node("C", 3, 3).await;
  fx.node("Blocker", 2, 2).await;
  let ab = fx.line(a, b).await;
  fx.line(a, c).await;

  let wf = fx.load().await;
  let outcome = fx.editor.split_transition(&wf, ab, "N").await.unwrap();

  // Midpoint of (1,1) and the mean (3,2) of A's successors is (2,1); free.
  assert_eq!(outcome.created_node().unwrap().position, Position::new(2, 1));

  let wf = fx.load().await;
  let ac = wf.outgoing(a).iter().find(|t| t.to == c).unwrap().transition_id;
  let outcome = fx.editor.split_transition(&wf, ac, "M").await.unwrap();
  // A's successors are now N (2,1) and C (3,3): mean (2,2), midpoint (1,1),
  // which is A itself, so the probe walks down to (1,2).
  assert_eq!(outcome.created_node().unwrap().position, Position::new(1, 2));
}

#[tokio::test]
async fn test_split_requires_name_and_transition() {
  let fx = Fixture::new().await;
  let a = fx.node("A", 1, 1).await;
  let b = fx.node("B", 3, 1).await;
  let ab = fx.line(a, b).await;
  let wf = fx.load().await;

  let outcome = fx.editor.split_transition(&wf, ab, "   ").await.unwrap();
  assert!(matches!(outcome, EditOutcome::Skipped { .. }));
  let outcome = fx
    .editor
    .split_transition(&wf, TransitionId(999), "N")
    .await
    .unwrap();
  assert!(matches!(outcome, EditOutcome::Skipped { .. }));
  assert_eq!(fx.load().await, wf);
}

#[tokio::test]
async fn test_partial_failure_leaves_committed_steps() {
  let fx = Fixture::new().await;
  let a = fx.node("A", 1, 1).await;
  let b = fx.node("B", 3, 1).await;
  let ab = fx.line(a, b).await;
  let wf = fx.load().await;

  fx.store.fail_after_writes(1);
  let err = fx.editor.split_transition(&wf, ab, "N").await.unwrap_err();
  assert!(matches!(
    err,
    EditError::Persistence {
      operation: "create_transition",
      completed_steps: 1,
      source: StoreError::Unavailable { .. },
    }
  ));

  fx.store.clear_failure();
  let after = fx.load().await;
  assert_eq!(after.nodes().len(), 3);
  assert_eq!(pairs(&after), vec![(a, b)]);
}

#[tokio::test]
async fn test_clone_copies_action_links_but_not_identity() {
  let fx = Fixture::new().await;
  let mut draft = NodeDraft::new(fx.workflow_id, "Approve", tenant().ownership(), "U");
  draft.description = Some("manager".to_string());
  draft.action = Some(ActionCode::UserWindow);
  draft.links.window_id = Some(143);
  draft.links.process_id = Some(5);
  draft.links.form_id = Some(9);
  draft.links.mail_text_id = Some(4);
  draft.position = Position::new(1, 1);
  let source = fx.store.create_node(&draft).await.unwrap();
  fx.node("Right", 2, 1).await;

  let wf = fx.load().await;
  let outcome = fx.editor.clone_node(&wf, source.node_id).await.unwrap();
  let copy = outcome.created_node().unwrap();

  assert_ne!(copy.node_id, source.node_id);
  assert_eq!(copy.name, "Approve (Copy)");
  assert_eq!(copy.description.as_deref(), Some("manager"));
  assert_eq!(copy.action, Some(ActionCode::UserWindow));
  assert_eq!(copy.links.window_id, Some(143));
  assert_eq!(copy.links.process_id, Some(5));
  assert_eq!(copy.links.form_id, Some(9));
  assert_eq!(copy.links.mail_text_id, None);
  assert_eq!(copy.owner, source.owner);
  // One column right is taken, so the copy goes one row down.
  assert_eq!(copy.position, Position::new(2, 2));
  assert!(fx.load().await.node(copy.node_id).is_some());
}

#[tokio::test]
async fn test_move_overwrites_only_the_position() {
  let fx = Fixture::new().await;
  let a = fx.node("A", 1, 1).await;
  let wf = fx.load().await;

  let outcome = fx
    .editor
    .move_node(&wf, a, Position::new(4, 7))
    .await
    .unwrap();
  assert!(outcome.is_applied());

  let before = wf.node(a).unwrap().clone();
  let after = fx.load().await.node(a).unwrap().clone();
  assert_eq!(after.position, Position::new(4, 7));
  assert_eq!(
    after,
    flowgrid_model::Node {
      position: Position::new(4, 7),
      ..before
    }
  );
}

#[tokio::test]
async fn test_placement_in_a_full_column_is_skipped() {
  let fx = Fixture::new().await;
  let last = fx.node("Last", 1, u32::MAX).await;
  fx.node("Right", 2, u32::MAX).await;
  fx.node("Further", 3, u32::MAX).await;
  let wf = fx.load().await;
  let writes = fx.store.write_count();

  let outcome = fx.editor.clone_node(&wf, last).await.unwrap();
  assert!(matches!(outcome, EditOutcome::Skipped { .. }));

  let outcome = fx
    .editor
    .insert_after_node(&wf, ActionCode::SendEmail, last)
    .await
    .unwrap();
  assert!(matches!(outcome, EditOutcome::Skipped { .. }));

  assert_eq!(fx.store.write_count(), writes);
  assert_eq!(fx.load().await, wf);
}

#[tokio::test]
async fn test_move_of_another_clients_node_has_no_effect() {
  let fx = Fixture::new().await;
  let shared = fx.node_owned("Shared", 1, 1, Ownership::new(0, 0)).await;
  let wf = fx.load().await;
  let writes = fx.store.write_count();

  let outcome = fx
    .editor
    .move_node(&wf, shared, Position::new(3, 3))
    .await
    .unwrap();
  assert!(matches!(outcome, EditOutcome::Skipped { .. }));
  assert_eq!(fx.store.write_count(), writes);
  assert_eq!(fx.load().await, wf);
}

#[tokio::test]
async fn test_delete_start_node_is_refused() {
  let fx = Fixture::new().await;
  let a = fx.node("A", 1, 1).await;
  fx.start(a).await;
  let wf = fx.load().await;

  let outcome = fx.editor.delete_node(&wf, a).await.unwrap();
  let EditOutcome::Refused { reason, report } = outcome else {
    panic!("expected a refusal");
  };
  assert!(reason.contains("could not be deleted"));
  assert_eq!(report.completed, 0);
  assert!(fx.load().await.node(a).is_some());
}

#[tokio::test]
async fn test_delete_node_cascades_transitions() {
  let fx = Fixture::new().await;
  let a = fx.node("A", 1, 1).await;
  let b = fx.node("B", 3, 1).await;
  let c = fx.node("C", 5, 1).await;
  fx.line(a, b).await;
  fx.line(b, c).await;
  let wf = fx.load().await;

  let outcome = fx.editor.delete_node(&wf, b).await.unwrap();
  assert!(outcome.is_applied());
  let after = fx.load().await;
  assert!(after.node(b).is_none());
  assert_eq!(after.transitions().len(), 0);
}

#[tokio::test]
async fn test_drop_on_empty_cell_uses_exact_cell_and_defaults() {
  let fx = Fixture::new().await;
  fx.store.register_entity(EntityKind::Window, 143, true);
  fx.node("A", 1, 1).await;
  let wf = fx.load().await;

  let outcome = fx
    .editor
    .drop_action(&wf, ActionCode::UserWindow, Position::new(2, 1))
    .await
    .unwrap();
  let node = outcome.created_node().unwrap();
  assert_eq!(node.position, Position::new(2, 1));
  assert_eq!(node.name, "User Window");
  assert_eq!(node.action, Some(ActionCode::UserWindow));
  assert_eq!(node.links.window_id, Some(143));
  assert_eq!(node.owner, tenant().ownership());
}

#[tokio::test]
async fn test_drop_on_node_inserts_after_it() {
  let fx = Fixture::new().await;
  let a = fx.node("A", 1, 1).await;
  let b = fx.node("B", 3, 1).await;
  let c = fx.node("C", 3, 3).await;
  let ab = fx.line(a, b).await;
  let ac = fx.line(a, c).await;
  let wf = fx.load().await;

  let outcome = fx
    .editor
    .drop_action(&wf, ActionCode::DocumentAction, Position::new(1, 1))
    .await
    .unwrap();
  let EditOutcome::Applied(report) = outcome else {
    panic!("expected the insert to apply");
  };
  let n = report.created_node.unwrap();
  // Midpoint of A (1,1) and the mean of B and C (3,2).
  assert_eq!(n.position, Position::new(2, 1));
  assert_eq!(n.links.doc_action.as_deref(), Some("CO"));
  assert_eq!(report.deleted_transitions, vec![ab, ac]);

  let after = fx.load().await;
  let mut links = pairs(&after);
  links.sort();
  let mut expected = vec![(n.node_id, b), (n.node_id, c), (a, n.node_id)];
  expected.sort();
  assert_eq!(links, expected);
}

#[tokio::test]
async fn test_insert_after_leaf_shifts_two_columns() {
  let fx = Fixture::new().await;
  let a = fx.node("A", 1, 1).await;
  fx.node("Blocker", 3, 1).await;
  let wf = fx.load().await;

  let outcome = fx
    .editor
    .insert_after_node(&wf, ActionCode::UserChoice, a)
    .await
    .unwrap();
  let n = outcome.created_node().unwrap().clone();
  assert_eq!(n.position, Position::new(3, 2));
  assert_eq!(pairs(&fx.load().await), vec![(a, n.node_id)]);
}

#[tokio::test]
async fn test_insert_at_occupied_cell_is_skipped() {
  let fx = Fixture::new().await;
  fx.node("A", 1, 1).await;
  let wf = fx.load().await;

  let outcome = fx
    .editor
    .insert_at_cell(&wf, ActionCode::UserForm, Position::new(1, 1))
    .await
    .unwrap();
  assert!(matches!(outcome, EditOutcome::Skipped { .. }));
}

#[tokio::test]
async fn test_add_transition_rules() {
  let fx = Fixture::new().await;
  let a = fx.node("A", 1, 1).await;
  let b = fx.node("B", 3, 1).await;
  let wf = fx.load().await;

  let outcome = fx.editor.add_transition(&wf, a, a).await.unwrap();
  assert!(matches!(outcome, EditOutcome::Skipped { .. }));

  let outcome = fx.editor.add_transition(&wf, a, b).await.unwrap();
  let EditOutcome::Applied(report) = outcome else {
    panic!("expected the transition to be created");
  };
  assert_eq!(report.created_transitions[0].owner, tenant().ownership());

  // Duplicates between the same pair are allowed.
  let outcome = fx.editor.add_transition(&wf, a, b).await.unwrap();
  assert!(outcome.is_applied());
  assert_eq!(fx.load().await.outgoing(a).len(), 2);
}

#[tokio::test]
async fn test_delete_transition() {
  let fx = Fixture::new().await;
  let a = fx.node("A", 1, 1).await;
  let b = fx.node("B", 3, 1).await;
  let ab = fx.line(a, b).await;
  let wf = fx.load().await;

  let outcome = fx
    .editor
    .apply(&wf, &EditAction::DeleteTransition { transition_id: ab })
    .await
    .unwrap();
  assert!(outcome.is_applied());
  assert_eq!(fx.load().await.transitions().len(), 0);

  let outcome = fx.editor.delete_transition(&wf, TransitionId(999)).await.unwrap();
  assert!(matches!(outcome, EditOutcome::Skipped { .. }));
}

#[tokio::test]
async fn test_create_and_edit_node() {
  let fx = Fixture::new().await;
  let wf = fx.load().await;

  let outcome = fx.editor.create_node(&wf, "").await.unwrap();
  assert!(matches!(outcome, EditOutcome::Skipped { .. }));

  let outcome = fx.editor.create_node(&wf, "Receive").await.unwrap();
  let node = outcome.created_node().unwrap().clone();
  assert_eq!(node.position, Position::new(0, 0));
  assert_eq!(node.owner, tenant().ownership());
  assert_eq!(node.entity_type, "U");

  let wf = fx.load().await;
  let outcome = fx
    .editor
    .edit_node(&wf, node.node_id, "Receive goods", Some("dock 4".to_string()))
    .await
    .unwrap();
  assert!(outcome.is_applied());
  let edited = fx.load().await.node(node.node_id).unwrap().clone();
  assert_eq!(edited.name, "Receive goods");
  assert_eq!(edited.description.as_deref(), Some("dock 4"));
  assert_eq!(edited.position, node.position);
}

#[tokio::test]
async fn test_system_tenant_stamps_dictionary_entity_type() {
  let store = Arc::new(MemoryStore::new());
  let wf = store
    .create_workflow("System", Ownership::new(0, 0))
    .await
    .unwrap();
  let editor = Editor::new(store.clone(), TenantContext::default());
  let workflow = store
    .load_workflow(wf, &TenantContext::default())
    .await
    .unwrap();

  let outcome = editor.create_node(&workflow, "Start").await.unwrap();
  assert_eq!(outcome.created_node().unwrap().entity_type, "D");
}

#[tokio::test]
async fn test_auto_layout_persists_changed_positions_only() {
  let fx = Fixture::new().await;
  let a = fx.node("A", 1, 1).await;
  let b = fx.node("B", 0, 0).await;
  let c = fx.node("C", 0, 0).await;
  fx.start(a).await;
  fx.line(a, b).await;
  fx.line(a, c).await;

  let wf = fx.load().await;
  let EditOutcome::Applied(report) = fx.editor.auto_layout(&wf).await.unwrap() else {
    panic!("layout should apply");
  };
  assert_eq!(report.updated_nodes, vec![b, c]);

  let wf = fx.load().await;
  assert_eq!(wf.node(a).unwrap().position, Position::new(1, 1));
  assert_eq!(wf.node(b).unwrap().position, Position::new(3, 1));
  assert_eq!(wf.node(c).unwrap().position, Position::new(3, 3));

  let EditOutcome::Applied(report) = fx.editor.auto_layout(&wf).await.unwrap() else {
    panic!("layout should apply");
  };
  assert_eq!(report.completed, 0);
  assert_eq!(fx.load().await, wf);
}
