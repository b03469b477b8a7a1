//! Mutation engine.
//!
//! Each operation looks at one workflow snapshot, checks its preconditions,
//! builds an [`EditPlan`] and runs it against the store. The snapshot is never
//! patched; callers reload the workflow after every edit.

use std::sync::Arc;

use flowgrid_layout::{AutoLayout, Occupancy};
use flowgrid_model::{
  ActionCode, ActionLinks, Node, NodeDraft, NodeId, Position, TenantContext, TransitionId,
  Workflow,
};
use flowgrid_store::Store;
use tracing::{debug, info, warn};

use crate::action::EditAction;
use crate::defaults::action_defaults;
use crate::error::EditError;
use crate::plan::{EditPlan, NodeRef, PlanReport, PlanResult, Step};

/// Suffix appended to the name of a cloned node.
pub const COPY_SUFFIX: &str = " (Copy)";

/// How an edit ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
  Applied(PlanReport),
  /// A precondition did not hold; nothing was written.
  Skipped { reason: String },
  /// The store refused a delete. Steps before it stay committed.
  Refused { reason: String, report: PlanReport },
}

impl EditOutcome {
  pub fn is_applied(&self) -> bool {
    matches!(self, EditOutcome::Applied(_))
  }

  /// The node an applied edit created, if any.
  pub fn created_node(&self) -> Option<&Node> {
    match self {
      EditOutcome::Applied(report) => report.created_node.as_ref(),
      _ => None,
    }
  }
}

fn skip(operation: &'static str, reason: impl Into<String>) -> EditOutcome {
  let reason = reason.into();
  info!(operation, %reason, "edit skipped");
  EditOutcome::Skipped { reason }
}

/// Free cell between `node` and the mean of its successors, or `shift`
/// columns to its right when it has none. `None` when that column is full.
fn place_after(workflow: &Workflow, node: &Node, shift: u32) -> Option<Position> {
  let anchor = Position::mean(workflow.successors(node.node_id).map(|n| n.position))
    .map(|mean| node.position.midpoint(mean))
    .unwrap_or_else(|| node.position.right(shift));
  Occupancy::new(workflow).next_free(anchor)
}

/// Applies edits for one tenant.
pub struct Editor<S: ?Sized> {
  store: Arc<S>,
  tenant: TenantContext,
}

impl<S: Store + ?Sized> Editor<S> {
  pub fn new(store: Arc<S>, tenant: TenantContext) -> Self {
    Self { store, tenant }
  }

  pub fn store(&self) -> &Arc<S> {
    &self.store
  }

  pub fn tenant(&self) -> &TenantContext {
    &self.tenant
  }

  /// Run any edit action.
  pub async fn apply(
    &self,
    workflow: &Workflow,
    action: &EditAction,
  ) -> Result<EditOutcome, EditError> {
    match action {
      EditAction::CreateNode { name } => self.create_node(workflow, name).await,
      EditAction::CloneNode { node_id } => self.clone_node(workflow, *node_id).await,
      EditAction::SplitTransition {
        transition_id,
        name,
      } => self.split_transition(workflow, *transition_id, name).await,
      EditAction::DropAction { action, position } => {
        self.drop_action(workflow, *action, *position).await
      }
      EditAction::InsertAfterNode { action, target } => {
        self.insert_after_node(workflow, *action, *target).await
      }
      EditAction::MoveNode { node_id, position } => {
        self.move_node(workflow, *node_id, *position).await
      }
      EditAction::EditNode {
        node_id,
        name,
        description,
      } => {
        self
          .edit_node(workflow, *node_id, name, description.clone())
          .await
      }
      EditAction::DeleteNode { node_id } => self.delete_node(workflow, *node_id).await,
      EditAction::AddTransition { from, to } => self.add_transition(workflow, *from, *to).await,
      EditAction::DeleteTransition { transition_id } => {
        self.delete_transition(workflow, *transition_id).await
      }
      EditAction::AutoLayout => self.auto_layout(workflow).await,
    }
  }

  /// Create a node at the unplaced position (0, 0).
  pub async fn create_node(&self, workflow: &Workflow, name: &str) -> Result<EditOutcome, EditError> {
    let name = name.trim();
    if name.is_empty() {
      return Ok(skip("create_node", "node name is empty"));
    }

    let draft = self.draft(workflow, name);
    self
      .run(EditPlan::new("create_node").step(Step::CreateNode(draft)))
      .await
  }

  /// Copy a node one column to the right of its source.
  ///
  /// The copy keeps the action, description, owner and the window, process
  /// and form links.
  pub async fn clone_node(
    &self,
    workflow: &Workflow,
    node_id: NodeId,
  ) -> Result<EditOutcome, EditError> {
    let Some(source) = workflow.node(node_id) else {
      return Ok(skip("clone_node", format!("node {node_id} not found")));
    };

    let mut draft = NodeDraft::new(
      workflow.workflow_id,
      format!("{}{}", source.name, COPY_SUFFIX),
      source.owner,
      self.tenant.entity_type(),
    );
    draft.description = source.description.clone();
    draft.action = source.action;
    draft.links = ActionLinks {
      window_id: source.links.window_id,
      process_id: source.links.process_id,
      form_id: source.links.form_id,
      ..ActionLinks::default()
    };
    let anchor = source.position.right(1);
    let Some(position) = Occupancy::new(workflow).next_free(anchor) else {
      return Ok(skip("clone_node", format!("no free cell below {anchor}")));
    };
    draft.position = position;

    self
      .run(EditPlan::new("clone_node").step(Step::CreateNode(draft)))
      .await
  }

  /// Put a new node in the middle of a transition.
  ///
  /// `from -> to` becomes `from -> new -> to`.
  pub async fn split_transition(
    &self,
    workflow: &Workflow,
    transition_id: TransitionId,
    name: &str,
  ) -> Result<EditOutcome, EditError> {
    let Some(transition) = workflow.transition(transition_id) else {
      return Ok(skip(
        "split_transition",
        format!("transition {transition_id} not found"),
      ));
    };
    let name = name.trim();
    if name.is_empty() {
      return Ok(skip("split_transition", "node name is empty"));
    }
    let Some(from) = workflow.node(transition.from) else {
      return Ok(skip(
        "split_transition",
        format!("node {} not found", transition.from),
      ));
    };

    let Some(position) = place_after(workflow, from, 1) else {
      return Ok(skip(
        "split_transition",
        format!("no free cell near node {}", from.node_id),
      ));
    };
    let mut draft = self.draft(workflow, name);
    draft.position = position;

    let owner = self.tenant.ownership();
    let plan = EditPlan::new("split_transition")
      .step(Step::CreateNode(draft))
      .step(Step::CreateTransition {
        from: transition.from.into(),
        to: NodeRef::Created,
        owner,
      })
      .step(Step::CreateTransition {
        from: NodeRef::Created,
        to: transition.to.into(),
        owner,
      })
      .step(Step::DeleteTransition(transition_id));
    self.run(plan).await
  }

  /// Create an action node exactly at an empty cell.
  pub async fn insert_at_cell(
    &self,
    workflow: &Workflow,
    action: ActionCode,
    position: Position,
  ) -> Result<EditOutcome, EditError> {
    if position.column == 0 || position.row == 0 {
      return Ok(skip("insert_at_cell", format!("{position} is not a grid cell")));
    }
    if let Some(node) = workflow.node_at(position) {
      return Ok(skip(
        "insert_at_cell",
        format!("{position} is occupied by node {}", node.node_id),
      ));
    }

    let mut draft = self.action_draft(workflow, action).await?;
    draft.position = position;
    self
      .run(EditPlan::new("insert_at_cell").step(Step::CreateNode(draft)))
      .await
  }

  /// Insert an action node right after `target`.
  ///
  /// The new node takes over every outgoing transition of the target and
  /// becomes its only successor.
  pub async fn insert_after_node(
    &self,
    workflow: &Workflow,
    action: ActionCode,
    target: NodeId,
  ) -> Result<EditOutcome, EditError> {
    let Some(node) = workflow.node(target) else {
      return Ok(skip("insert_after_node", format!("node {target} not found")));
    };

    let Some(position) = place_after(workflow, node, 2) else {
      return Ok(skip(
        "insert_after_node",
        format!("no free cell near node {target}"),
      ));
    };
    let mut draft = self.action_draft(workflow, action).await?;
    draft.position = position;

    let owner = self.tenant.ownership();
    let mut plan = EditPlan::new("insert_after_node").step(Step::CreateNode(draft));
    for transition in workflow.outgoing(target) {
      plan.push(Step::CreateTransition {
        from: NodeRef::Created,
        to: transition.to.into(),
        owner,
      });
      plan.push(Step::DeleteTransition(transition.transition_id));
    }
    plan.push(Step::CreateTransition {
      from: target.into(),
      to: NodeRef::Created,
      owner,
    });
    self.run(plan).await
  }

  /// Handle an action dropped on the grid.
  pub async fn drop_action(
    &self,
    workflow: &Workflow,
    action: ActionCode,
    position: Position,
  ) -> Result<EditOutcome, EditError> {
    match workflow.node_at(position) {
      Some(node) => self.insert_after_node(workflow, action, node.node_id).await,
      None => self.insert_at_cell(workflow, action, position).await,
    }
  }

  /// Move a node owned by the acting tenant to another cell.
  pub async fn move_node(
    &self,
    workflow: &Workflow,
    node_id: NodeId,
    position: Position,
  ) -> Result<EditOutcome, EditError> {
    let Some(node) = workflow.node(node_id) else {
      return Ok(skip("move_node", format!("node {node_id} not found")));
    };
    if !self.tenant.owns(&node.owner) {
      warn!(
        node_id = %node_id,
        owner_client_id = node.owner.client_id,
        client_id = self.tenant.client_id,
        "node belongs to another client, move ignored"
      );
      return Ok(EditOutcome::Skipped {
        reason: format!("node {node_id} belongs to client {}", node.owner.client_id),
      });
    }

    let mut moved = node.clone();
    moved.position = position;
    self
      .run(EditPlan::new("move_node").step(Step::UpdateNode(moved)))
      .await
  }

  /// Overwrite the name and description of a node.
  pub async fn edit_node(
    &self,
    workflow: &Workflow,
    node_id: NodeId,
    name: &str,
    description: Option<String>,
  ) -> Result<EditOutcome, EditError> {
    let Some(node) = workflow.node(node_id) else {
      return Ok(skip("edit_node", format!("node {node_id} not found")));
    };
    let name = name.trim();
    if name.is_empty() {
      return Ok(skip("edit_node", "node name is empty"));
    }

    let mut edited = node.clone();
    edited.name = name.to_string();
    edited.description = description.filter(|d| !d.trim().is_empty());
    self
      .run(EditPlan::new("edit_node").step(Step::UpdateNode(edited)))
      .await
  }

  /// Delete a node with its transitions.
  pub async fn delete_node(
    &self,
    workflow: &Workflow,
    node_id: NodeId,
  ) -> Result<EditOutcome, EditError> {
    if workflow.node(node_id).is_none() {
      return Ok(skip("delete_node", format!("node {node_id} not found")));
    }
    self
      .run(EditPlan::new("delete_node").step(Step::DeleteNode(node_id)))
      .await
  }

  /// Add a transition between two distinct nodes.
  pub async fn add_transition(
    &self,
    workflow: &Workflow,
    from: NodeId,
    to: NodeId,
  ) -> Result<EditOutcome, EditError> {
    if from == to {
      return Ok(skip("add_transition", format!("node {from} cannot link to itself")));
    }
    for node_id in [from, to] {
      if workflow.node(node_id).is_none() {
        return Ok(skip("add_transition", format!("node {node_id} not found")));
      }
    }

    let plan = EditPlan::new("add_transition").step(Step::CreateTransition {
      from: from.into(),
      to: to.into(),
      owner: self.tenant.ownership(),
    });
    self.run(plan).await
  }

  pub async fn delete_transition(
    &self,
    workflow: &Workflow,
    transition_id: TransitionId,
  ) -> Result<EditOutcome, EditError> {
    if workflow.transition(transition_id).is_none() {
      return Ok(skip(
        "delete_transition",
        format!("transition {transition_id} not found"),
      ));
    }
    self
      .run(EditPlan::new("delete_transition").step(Step::DeleteTransition(transition_id)))
      .await
  }

  /// Lay the workflow out and persist every position that changed.
  pub async fn auto_layout(&self, workflow: &Workflow) -> Result<EditOutcome, EditError> {
    let layout = AutoLayout::for_workflow(workflow).compute(workflow);

    let mut plan = EditPlan::new("auto_layout");
    for placement in layout.changed() {
      if let Some(node) = workflow.node(placement.node_id) {
        let mut placed = node.clone();
        placed.position = placement.to;
        plan.push(Step::UpdateNode(placed));
      }
    }

    if plan.is_empty() {
      debug!(workflow_id = %workflow.workflow_id, "layout unchanged");
    } else {
      debug!(
        workflow_id = %workflow.workflow_id,
        moved = plan.steps().len(),
        "persisting layout"
      );
    }
    self.run(plan).await
  }

  fn draft(&self, workflow: &Workflow, name: &str) -> NodeDraft {
    NodeDraft::new(
      workflow.workflow_id,
      name,
      self.tenant.ownership(),
      self.tenant.entity_type(),
    )
  }

  /// Draft of a node created by dropping an action, named after the action.
  async fn action_draft(
    &self,
    workflow: &Workflow,
    action: ActionCode,
  ) -> Result<NodeDraft, EditError> {
    let mut draft = self.draft(workflow, action.label());
    draft.action = Some(action);
    draft.links = action_defaults(self.store.as_ref(), action, workflow.workflow_id).await?;
    Ok(draft)
  }

  async fn run(&self, plan: EditPlan) -> Result<EditOutcome, EditError> {
    match plan.execute(self.store.as_ref()).await? {
      PlanResult::Completed(report) => Ok(EditOutcome::Applied(report)),
      PlanResult::Refused { step, report } => {
        let reason = match plan.steps().get(step) {
          Some(Step::DeleteNode(node_id)) => format!("node {node_id} could not be deleted"),
          Some(Step::DeleteTransition(transition_id)) => {
            format!("transition {transition_id} could not be deleted")
          }
          _ => format!("{} was refused", plan.label()),
        };
        Ok(EditOutcome::Refused { reason, report })
      }
    }
  }
}
